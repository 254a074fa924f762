//! Mutable state carried from one poll iteration to the next.

use chrono::Utc;

/// Everything the scheduler remembers between iterations.
///
/// Nothing here is persisted; a restart begins from a fresh state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    /// Lower bound (unix seconds) for the next `from_date` query.
    pub cursor: i64,

    /// Last status message the chat actually received.
    pub last_notified: Option<String>,

    /// Status message whose delivery failed and is owed to the chat.
    pub pending: Option<String>,

    /// Last failure report sent, to avoid repeating it every cycle.
    pub last_error: Option<String>,
}

impl PollState {
    /// Fresh state with the cursor at the given timestamp.
    pub fn starting_at(cursor: i64) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    /// Fresh state with the cursor at the current time.
    pub fn starting_now() -> Self {
        Self::starting_at(Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_at() {
        let state = PollState::starting_at(1_700_000_000);
        assert_eq!(state.cursor, 1_700_000_000);
        assert!(state.last_notified.is_none());
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_starting_now_is_recent() {
        let before = Utc::now().timestamp();
        let state = PollState::starting_now();
        assert!(state.cursor >= before);
    }
}
