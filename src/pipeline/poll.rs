// src/pipeline/poll.rs

//! Poll loop: fetch → validate → parse → detect → notify → advance cursor → sleep.

use std::time::Duration;

use crate::error::{AppError, ErrorKind, Result};
use crate::models::{PollConfig, PollState};
use crate::services::{HomeworkSource, Notifier};

use super::diff::ChangeDetector;
use super::parse::parse_status;
use super::validate::validate_response;

/// What a single iteration ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The response carried no homeworks and nothing was pending.
    NoUpdates,
    /// The latest status was already delivered.
    Unchanged,
    /// A status message was delivered.
    Notified(String),
    /// Sending the status message failed; it stays pending.
    DeliveryFailed(String),
    /// Fetch, validation or parsing failed; state was left as it was.
    Failed(ErrorKind),
}

/// Data extracted from a successful fetch.
struct Observation {
    message: Option<String>,
    current_date: Option<i64>,
}

/// Drives the poll loop for one chat.
pub struct PollScheduler<'a> {
    source: &'a dyn HomeworkSource,
    notifier: &'a dyn Notifier,
    chat_id: String,
    config: PollConfig,
    detector: ChangeDetector,
}

impl<'a> PollScheduler<'a> {
    pub fn new(
        source: &'a dyn HomeworkSource,
        notifier: &'a dyn Notifier,
        chat_id: impl Into<String>,
        config: &PollConfig,
    ) -> Self {
        Self {
            source,
            notifier,
            chat_id: chat_id.into(),
            config: config.clone(),
            detector: ChangeDetector::new(config.policy),
        }
    }

    /// Fixed pause between iterations.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.config.retry_interval_secs)
    }

    /// Poll forever. Only process termination stops the loop.
    pub async fn run(&self, mut state: PollState) {
        log::info!(
            "Polling every {}s ({:?} policy) starting from {}",
            self.config.retry_interval_secs,
            self.detector.policy(),
            state.cursor
        );

        loop {
            let (next, outcome) = self.poll_once(state).await;
            state = next;
            log::debug!("Iteration finished: {:?}, cursor={}", outcome, state.cursor);

            tokio::time::sleep(self.retry_interval()).await;
        }
    }

    /// Run one iteration, taking the state in and handing the updated state back.
    pub async fn poll_once(&self, mut state: PollState) -> (PollState, PollOutcome) {
        let observation = match self.observe(state.cursor).await {
            Ok(observation) => observation,
            Err(e) => {
                match e.status() {
                    Some(code) => {
                        log::error!("Poll failed ({} error, HTTP {}): {}", e.kind(), code, e)
                    }
                    None => log::error!("Poll failed ({} error): {}", e.kind(), e),
                }
                self.report_failure(&mut state, &e).await;
                return (state, PollOutcome::Failed(e.kind()));
            }
        };

        state.last_error = None;
        if let Some(date) = observation.current_date {
            log::debug!("Cursor {} -> {}", state.cursor, date);
            state.cursor = date;
        }

        // A fresh status supersedes one still owed from a failed send.
        let message = match observation.message {
            Some(message) => {
                state.pending = None;
                message
            }
            None => match state.pending.take() {
                Some(message) => {
                    log::info!("Retrying undelivered status message");
                    message
                }
                None => {
                    log::debug!("No new homework statuses");
                    return (state, PollOutcome::NoUpdates);
                }
            },
        };

        if !self
            .detector
            .should_notify(&message, state.last_notified.as_deref())
        {
            log::debug!("Homework status unchanged");
            return (state, PollOutcome::Unchanged);
        }

        match self.notifier.send_message(&self.chat_id, &message).await {
            Ok(()) => {
                log::info!("Status message sent: {}", message);
                state.last_notified = Some(message.clone());
                (state, PollOutcome::Notified(message))
            }
            Err(e) => {
                log::error!("{}; retrying next cycle", e);
                state.pending = Some(message.clone());
                (state, PollOutcome::DeliveryFailed(message))
            }
        }
    }

    async fn observe(&self, cursor: i64) -> Result<Observation> {
        let raw = self.source.fetch(cursor).await?;
        let envelope = validate_response(&raw)?;

        let message = match envelope.latest() {
            Some(record) => Some(parse_status(record)?),
            None => None,
        };

        Ok(Observation {
            message,
            current_date: envelope.current_date,
        })
    }

    /// Best-effort failure report; its own errors are only logged.
    async fn report_failure(&self, state: &mut PollState, error: &AppError) {
        if !self.config.report_errors {
            return;
        }

        let report = format!("Bot malfunction: {error}");
        if state.last_error.as_deref() == Some(report.as_str()) {
            log::debug!("Failure already reported to chat");
            return;
        }

        match self.notifier.send_message(&self.chat_id, &report).await {
            Ok(()) => state.last_error = Some(report),
            Err(e) => log::warn!("Could not report failure to chat: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::models::NotifyPolicy;

    const CHAT: &str = "42";
    const START: i64 = 1_600_000_000;
    const APPROVED: &str =
        "Changed review status of \"diplom\". Работа проверена: ревьюеру всё понравилось. Ура!";

    #[derive(Default)]
    struct FakeSource {
        responses: Mutex<VecDeque<Result<Value>>>,
        cursors: Mutex<Vec<i64>>,
    }

    impl FakeSource {
        fn with(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn cursors(&self) -> Vec<i64> {
            self.cursors.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HomeworkSource for FakeSource {
        async fn fetch(&self, from_date: i64) -> Result<Value> {
            self.cursors.lock().unwrap().push(from_date);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"homeworks": []})))
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<(String, String)>>,
        failing: AtomicBool,
    }

    impl FakeNotifier {
        fn failing() -> Self {
            let notifier = Self::default();
            notifier.set_failing(true);
            notifier
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn texts(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(_, text)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::delivery("chat not found"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn quiet() -> PollConfig {
        PollConfig {
            report_errors: false,
            ..PollConfig::default()
        }
    }

    fn approved(current_date: Option<i64>) -> Value {
        let mut raw = json!({"homeworks": [{"homework_name": "diplom", "status": "approved"}]});
        if let Some(date) = current_date {
            raw["current_date"] = json!(date);
        }
        raw
    }

    #[tokio::test]
    async fn test_status_change_is_sent_and_cursor_advanced() {
        let source = FakeSource::with(vec![Ok(approved(Some(1_700_000_000)))]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, outcome) = scheduler.poll_once(PollState::starting_at(START)).await;

        assert_eq!(outcome, PollOutcome::Notified(APPROVED.to_string()));
        assert_eq!(state.cursor, 1_700_000_000);
        assert_eq!(state.last_notified.as_deref(), Some(APPROVED));
        assert_eq!(source.cursors(), vec![START]);
        assert_eq!(
            notifier.sent.lock().unwrap().clone(),
            vec![(CHAT.to_string(), APPROVED.to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_homeworks_do_nothing() {
        let source = FakeSource::with(vec![Ok(json!({"homeworks": []}))]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, outcome) = scheduler.poll_once(PollState::starting_at(START)).await;

        assert_eq!(outcome, PollOutcome::NoUpdates);
        assert_eq!(state, PollState::starting_at(START));
        assert!(notifier.texts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_homeworks_key_is_shape_failure() {
        let source = FakeSource::with(vec![Ok(json!({"status": "ok"}))]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &PollConfig::default());

        let (state, outcome) = scheduler.poll_once(PollState::starting_at(START)).await;

        assert_eq!(outcome, PollOutcome::Failed(ErrorKind::Shape));
        assert_eq!(state.cursor, START);
        assert!(state.last_notified.is_none());

        let texts = notifier.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Bot malfunction:"));
    }

    #[tokio::test]
    async fn test_unavailable_api_keeps_cursor_for_retry() {
        let source = FakeSource::with(vec![
            Err(AppError::transport(Some(503), "Service Unavailable")),
            Ok(approved(Some(1_700_000_000))),
        ]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, outcome) = scheduler.poll_once(PollState::starting_at(START)).await;
        assert_eq!(outcome, PollOutcome::Failed(ErrorKind::Transport));
        assert_eq!(state.cursor, START);

        let (state, outcome) = scheduler.poll_once(state).await;
        assert!(matches!(outcome, PollOutcome::Notified(_)));
        assert_eq!(source.cursors(), vec![START, START]);
        assert_eq!(state.cursor, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_unchanged_status_sent_once() {
        let source = FakeSource::with(vec![Ok(approved(None)), Ok(approved(None))]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, first) = scheduler.poll_once(PollState::starting_at(START)).await;
        let (_, second) = scheduler.poll_once(state).await;

        assert!(matches!(first, PollOutcome::Notified(_)));
        assert_eq!(second, PollOutcome::Unchanged);
        assert_eq!(notifier.texts().len(), 1);
    }

    #[tokio::test]
    async fn test_every_poll_policy_repeats() {
        let source = FakeSource::with(vec![Ok(approved(None)), Ok(approved(None))]);
        let notifier = FakeNotifier::default();
        let config = PollConfig {
            policy: NotifyPolicy::EveryPoll,
            ..quiet()
        };
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &config);

        let (state, _) = scheduler.poll_once(PollState::starting_at(START)).await;
        let (_, second) = scheduler.poll_once(state).await;

        assert!(matches!(second, PollOutcome::Notified(_)));
        assert_eq!(notifier.texts(), vec![APPROVED, APPROVED]);
    }

    #[tokio::test]
    async fn test_cursor_kept_without_current_date() {
        let source = FakeSource::with(vec![Ok(approved(None))]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, _) = scheduler.poll_once(PollState::starting_at(START)).await;
        assert_eq!(state.cursor, START);
    }

    #[tokio::test]
    async fn test_parse_failure_does_not_advance_cursor() {
        let raw = json!({
            "homeworks": [{"homework_name": "diplom", "status": "lost"}],
            "current_date": 1_700_000_000
        });
        let source = FakeSource::with(vec![Ok(raw)]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, outcome) = scheduler.poll_once(PollState::starting_at(START)).await;

        assert_eq!(outcome, PollOutcome::Failed(ErrorKind::Parse));
        assert_eq!(state.cursor, START);
        assert!(notifier.texts().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_redelivered() {
        let source = FakeSource::with(vec![
            Ok(approved(Some(1_700_000_000))),
            Ok(json!({"homeworks": [], "current_date": 1_700_000_600})),
        ]);
        let notifier = FakeNotifier::failing();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, outcome) = scheduler.poll_once(PollState::starting_at(START)).await;
        assert_eq!(outcome, PollOutcome::DeliveryFailed(APPROVED.to_string()));
        assert!(state.last_notified.is_none());
        assert_eq!(state.pending.as_deref(), Some(APPROVED));
        assert_eq!(state.cursor, 1_700_000_000);

        notifier.set_failing(false);
        let (state, outcome) = scheduler.poll_once(state).await;
        assert_eq!(outcome, PollOutcome::Notified(APPROVED.to_string()));
        assert_eq!(state.last_notified.as_deref(), Some(APPROVED));
        assert!(state.pending.is_none());
        assert_eq!(notifier.texts(), vec![APPROVED]);
    }

    #[tokio::test]
    async fn test_fresh_status_supersedes_pending() {
        let reviewing = json!({"homeworks": [{"homework_name": "diplom", "status": "reviewing"}]});
        let source = FakeSource::with(vec![Ok(reviewing), Ok(approved(None))]);
        let notifier = FakeNotifier::failing();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &quiet());

        let (state, _) = scheduler.poll_once(PollState::starting_at(START)).await;
        notifier.set_failing(false);
        let (state, outcome) = scheduler.poll_once(state).await;

        assert_eq!(outcome, PollOutcome::Notified(APPROVED.to_string()));
        assert!(state.pending.is_none());
        assert_eq!(notifier.texts(), vec![APPROVED]);
    }

    #[tokio::test]
    async fn test_repeated_failure_reported_once() {
        let source = FakeSource::with(vec![
            Err(AppError::transport(Some(503), "Service Unavailable")),
            Err(AppError::transport(Some(503), "Service Unavailable")),
            Ok(json!({"homeworks": []})),
            Err(AppError::transport(Some(503), "Service Unavailable")),
        ]);
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &PollConfig::default());

        let mut state = PollState::starting_at(START);
        for _ in 0..4 {
            state = scheduler.poll_once(state).await.0;
        }

        // the successful iteration in between re-arms the report
        assert_eq!(notifier.texts().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_report_is_swallowed() {
        let source = FakeSource::with(vec![Err(AppError::transport(None, "connection reset"))]);
        let notifier = FakeNotifier::failing();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &PollConfig::default());

        let (state, outcome) = scheduler.poll_once(PollState::starting_at(START)).await;

        assert_eq!(outcome, PollOutcome::Failed(ErrorKind::Transport));
        assert!(state.last_error.is_none());
        assert_eq!(state.cursor, START);
    }

    #[test]
    fn test_retry_interval_from_config() {
        let source = FakeSource::default();
        let notifier = FakeNotifier::default();
        let scheduler = PollScheduler::new(&source, &notifier, CHAT, &PollConfig::default());
        assert_eq!(scheduler.retry_interval(), Duration::from_secs(600));
    }
}
