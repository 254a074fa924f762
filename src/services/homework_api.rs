// src/services/homework_api.rs

//! Review API client.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Request, StatusCode};
use serde_json::Value;

use super::HomeworkSource;
use crate::error::{AppError, Result};
use crate::utils::truncate;

/// Authenticated client for the homework statuses endpoint.
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    pub fn new(client: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    fn build_request(&self, from_date: i64) -> reqwest::Result<Request> {
        self.client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()
    }
}

/// Reject anything but `200 OK`, keeping a snippet of the body for context.
fn check_status(status: StatusCode, body: &str) -> Result<()> {
    if status == StatusCode::OK {
        return Ok(());
    }
    let reason = status.canonical_reason().unwrap_or("unexpected status");
    let snippet = truncate(body.trim(), 200);
    let message = if snippet.is_empty() {
        reason.to_string()
    } else {
        format!("{reason}: {snippet}")
    };
    Err(AppError::transport(Some(status.as_u16()), message))
}

fn decode_body(body: &str) -> Result<Value> {
    serde_json::from_str(body)
        .map_err(|e| AppError::shape(format!("response body is not valid JSON: {e}")))
}

#[async_trait]
impl HomeworkSource for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        let request = self
            .build_request(from_date)
            .map_err(|e| AppError::transport(None, e))?;

        log::debug!("GET {} (from_date={})", self.endpoint, from_date);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| AppError::transport(e.status().map(|s| s.as_u16()), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport(Some(status.as_u16()), e))?;
        check_status(status, &body)?;

        decode_body(&body)
    }
}
