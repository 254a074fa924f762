//! Review API payload types.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::AppError;

/// Review status codes known to the bot, with their verdict text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl ReviewStatus {
    /// Every known status, in verdict-table order.
    pub const ALL: [ReviewStatus; 3] = [
        ReviewStatus::Approved,
        ReviewStatus::Reviewing,
        ReviewStatus::Rejected,
    ];

    /// Status code as sent by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "approved",
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Rejected => "rejected",
        }
    }

    /// Human-readable verdict for this status.
    pub fn verdict(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            ReviewStatus::Reviewing => "Работа взята на проверку ревьюером.",
            ReviewStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::UnknownVerdict(s.to_string()))
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated entry of the `homeworks` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworkRecord {
    pub homework_name: String,
    pub status: ReviewStatus,
}

/// A response that passed shape validation.
///
/// Records are kept untyped; they are checked one at a time by the status
/// parser.
#[derive(Debug, Clone, Copy)]
pub struct ResponseEnvelope<'a> {
    pub homeworks: &'a [Value],
    pub current_date: Option<i64>,
}

impl ResponseEnvelope<'_> {
    /// Most recent submission, which the API lists first.
    pub fn latest(&self) -> Option<&Value> {
        self.homeworks.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in ReviewStatus::ALL {
            assert_eq!(status.as_str().parse::<ReviewStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status() {
        let err = "accepted".parse::<ReviewStatus>().unwrap_err();
        assert!(matches!(err, AppError::UnknownVerdict(ref s) if s == "accepted"));

        // codes are case-sensitive
        assert!("Approved".parse::<ReviewStatus>().is_err());
    }

    #[test]
    fn test_verdicts_are_distinct() {
        let verdicts: std::collections::HashSet<_> =
            ReviewStatus::ALL.iter().map(|s| s.verdict()).collect();
        assert_eq!(verdicts.len(), ReviewStatus::ALL.len());
    }
}
