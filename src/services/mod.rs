//! Outbound capabilities used by the poll loop.
//!
//! - `HomeworkSource`: fetches raw homework statuses (`PracticumClient`)
//! - `Notifier`: delivers text to a chat (`TelegramNotifier`)

mod homework_api;
mod telegram;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use homework_api::PracticumClient;
pub use telegram::TelegramNotifier;

/// Source of raw review-status payloads.
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    /// Fetch statuses updated since `from_date` (unix seconds).
    ///
    /// The payload is returned unvalidated. Network failures and non-200
    /// responses are `Transport` errors.
    async fn fetch(&self, from_date: i64) -> Result<Value>;
}

/// Messaging channel capable of sending a text to a chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text` to `chat_id`. Any failure is a `Delivery` error.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}
