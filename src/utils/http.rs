// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::{ApiConfig, Config};

/// Create a configured asynchronous HTTP client.
pub fn create_client(user_agent: &str, timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Client for the review API.
pub fn create_api_client(config: &ApiConfig) -> Result<reqwest::Client> {
    create_client(&config.user_agent, config.timeout_secs)
}

/// Client for the Telegram Bot API.
pub fn create_telegram_client(config: &Config) -> Result<reqwest::Client> {
    create_client(&config.api.user_agent, config.telegram.timeout_secs)
}
