// src/error.rs

//! Unified error handling for the homework bot.
//!
//! Every variant belongs to exactly one [`ErrorKind`]. The poll loop branches
//! on the kind: `Config` aborts startup, everything else is retried on the
//! next cycle.

use std::fmt;

use thiserror::Error;

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse classification used by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential or broken configuration. Fatal.
    Config,
    /// Network failure or unexpected HTTP status from the review API.
    Transport,
    /// Response payload does not have the expected structure.
    Shape,
    /// A homework record is missing fields or carries an unknown status.
    Parse,
    /// The messaging channel refused or could not deliver a message.
    Delivery,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Transport => "transport",
            ErrorKind::Shape => "shape",
            ErrorKind::Parse => "parse",
            ErrorKind::Delivery => "delivery",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required secret absent from the environment
    #[error("Missing required environment variable {0}")]
    MissingCredential(&'static str),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request to the review API failed
    #[error("Endpoint request failed ({}): {message}", status_label(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Response payload has an unexpected structure
    #[error("Unexpected API response: {0}")]
    Shape(String),

    /// Homework record lacks a required key
    #[error("Homework record has no `{0}` key")]
    MissingField(&'static str),

    /// Homework record field has the wrong type
    #[error("Homework record field `{0}` is not a string")]
    InvalidField(&'static str),

    /// Status code outside the verdict table
    #[error("Undocumented homework status: {0:?}")]
    UnknownVerdict(String),

    /// Messaging channel failure
    #[error("Failed to deliver message: {0}")]
    Delivery(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a transport error with an optional HTTP status.
    pub fn transport(status: Option<u16>, message: impl fmt::Display) -> Self {
        Self::Transport {
            status,
            message: message.to_string(),
        }
    }

    /// Create a shape error.
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery(message.to_string())
    }

    /// The error kind this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::MissingCredential(_) | Self::Io(_) | Self::Toml(_) => {
                ErrorKind::Config
            }
            Self::Http(_) | Self::Transport { .. } => ErrorKind::Transport,
            Self::Shape(_) => ErrorKind::Shape,
            Self::MissingField(_) | Self::InvalidField(_) | Self::UnknownVerdict(_) => {
                ErrorKind::Parse
            }
            Self::Delivery(_) => ErrorKind::Delivery,
        }
    }

    /// Whether the error must stop the process.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Config
    }

    /// HTTP status carried by a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
