//! Utility functions and helpers.

pub mod http;

/// Shorten text for log lines, respecting char boundaries.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
