// src/services/telegram.rs

//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use serde::{Deserialize, Serialize};

use super::Notifier;
use crate::error::{AppError, Result};

/// `sendMessage` request body.
#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API method replies with.
#[derive(Debug, Deserialize)]
struct BotReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages through `https://api.telegram.org/bot<token>/sendMessage`.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramNotifier {
    pub fn new(client: Client, api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        )
    }

    fn build_request(&self, chat_id: &str, text: &str) -> reqwest::Result<Request> {
        self.client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .build()
    }
}

/// Interpret a Bot API reply; the body decides even when the status is 200.
fn check_reply(status: StatusCode, body: &str) -> Result<()> {
    match serde_json::from_str::<BotReply>(body) {
        Ok(reply) if reply.ok && status.is_success() => Ok(()),
        Ok(reply) => Err(AppError::delivery(format!(
            "{} ({})",
            reply
                .description
                .unwrap_or_else(|| "request rejected".to_string()),
            status.as_u16()
        ))),
        Err(_) => Err(AppError::delivery(format!(
            "unreadable Bot API reply ({})",
            status.as_u16()
        ))),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let request = self
            .build_request(chat_id, text)
            .map_err(|e| AppError::delivery(e.without_url()))?;

        // reqwest::Error displays the URL, which embeds the bot token
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| AppError::delivery(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::delivery(e.without_url()))?;
        check_reply(status, &body)?;

        log::debug!("Message delivered to chat {}", chat_id);
        Ok(())
    }
}
