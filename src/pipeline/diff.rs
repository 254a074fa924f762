//! Change detection between the newest status message and the last one
//! delivered to the chat.

use crate::models::NotifyPolicy;

/// Whether `new` differs from the last delivered message.
///
/// Comparison is on the full formatted text; nothing delivered yet counts
/// as a change.
pub fn has_changed(new: &str, last: Option<&str>) -> bool {
    last != Some(new)
}

/// Decides whether a parsed status message should be sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    policy: NotifyPolicy,
}

impl ChangeDetector {
    pub fn new(policy: NotifyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    pub fn should_notify(&self, new: &str, last: Option<&str>) -> bool {
        match self.policy {
            NotifyPolicy::OnChange => has_changed(new, last),
            NotifyPolicy::EveryPoll => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVIEWING: &str = "Changed review status of \"diplom\". Работа взята на проверку ревьюером.";
    const APPROVED: &str =
        "Changed review status of \"diplom\". Работа проверена: ревьюеру всё понравилось. Ура!";

    #[test]
    fn test_first_message_is_a_change() {
        assert!(has_changed(REVIEWING, None));
    }

    #[test]
    fn test_same_message_is_not_a_change() {
        assert!(!has_changed(REVIEWING, Some(REVIEWING)));
    }

    #[test]
    fn test_different_message_is_a_change() {
        assert!(has_changed(APPROVED, Some(REVIEWING)));
    }

    #[test]
    fn test_every_poll_ignores_history() {
        let detector = ChangeDetector::new(NotifyPolicy::EveryPoll);
        assert!(detector.should_notify(REVIEWING, Some(REVIEWING)));
    }

    #[test]
    fn test_default_policy_is_on_change() {
        let detector = ChangeDetector::default();
        assert_eq!(detector.policy(), NotifyPolicy::OnChange);
        assert!(!detector.should_notify(REVIEWING, Some(REVIEWING)));
        assert!(detector.should_notify(APPROVED, Some(REVIEWING)));
    }
}
