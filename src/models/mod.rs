// src/models/mod.rs

//! Domain models for the homework bot.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod credentials;
mod homework;
mod state;

// Re-export all public types
pub use config::{ApiConfig, Config, LoggingConfig, NotifyPolicy, PollConfig, TelegramConfig};
pub use credentials::{Credentials, PRACTICUM_TOKEN, TELEGRAM_CHAT_ID, TELEGRAM_TOKEN};
pub use homework::{HomeworkRecord, ResponseEnvelope, ReviewStatus};
pub use state::PollState;
