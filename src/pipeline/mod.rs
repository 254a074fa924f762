//! Poll pipeline stages.
//!
//! - `validate`: checks the raw payload shape
//! - `parse`: turns the latest homework record into a status message
//! - `diff`: decides whether the message is worth sending
//! - `poll`: the scheduler tying the stages to the source and notifier

pub mod diff;
pub mod parse;
pub mod poll;
pub mod validate;

pub use diff::{ChangeDetector, has_changed};
pub use parse::{format_status, parse_record, parse_status};
pub use poll::{PollOutcome, PollScheduler};
pub use validate::validate_response;
