// src/pipeline/validate.rs

//! Shape validation of raw review API payloads.

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::ResponseEnvelope;

/// Check that `raw` is an object holding a `homeworks` array.
///
/// `current_date` is optional, but when present it must be an integer.
/// Records inside `homeworks` are not inspected here.
pub fn validate_response(raw: &Value) -> Result<ResponseEnvelope<'_>> {
    let object = raw
        .as_object()
        .ok_or_else(|| AppError::shape(format!("expected an object, got {}", type_name(raw))))?;

    let homeworks = object
        .get("homeworks")
        .ok_or_else(|| AppError::shape("no `homeworks` key in response"))?;

    let homeworks = homeworks.as_array().ok_or_else(|| {
        AppError::shape(format!(
            "`homeworks` must be an array, got {}",
            type_name(homeworks)
        ))
    })?;

    let current_date = match object.get("current_date") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_i64().ok_or_else(|| {
            AppError::shape(format!(
                "`current_date` must be an integer, got {}",
                type_name(value)
            ))
        })?),
    };

    Ok(ResponseEnvelope {
        homeworks,
        current_date,
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
