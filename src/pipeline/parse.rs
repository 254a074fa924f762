// src/pipeline/parse.rs

//! Homework record parsing and status message formatting.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{HomeworkRecord, ReviewStatus};

/// Build a typed record from one `homeworks` entry.
pub fn parse_record(record: &Value) -> Result<HomeworkRecord> {
    let homework_name = string_field(record, "homework_name")?;
    let status: ReviewStatus = string_field(record, "status")?.parse()?;

    Ok(HomeworkRecord {
        homework_name: homework_name.to_string(),
        status,
    })
}

/// Human-readable status message for a record.
pub fn format_status(record: &HomeworkRecord) -> String {
    format!(
        "Changed review status of \"{}\". {}",
        record.homework_name,
        record.status.verdict()
    )
}

/// Parse a raw record straight into its status message.
pub fn parse_status(record: &Value) -> Result<String> {
    parse_record(record).map(|record| format_status(&record))
}

fn string_field<'a>(record: &'a Value, field: &'static str) -> Result<&'a str> {
    match record.get(field) {
        None | Some(Value::Null) => Err(AppError::MissingField(field)),
        Some(value) => value.as_str().ok_or(AppError::InvalidField(field)),
    }
}
