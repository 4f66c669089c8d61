// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use campus_checkin_model::{Role, ScanVerdict};
use serde::Serialize;
use tracing::{info, warn};

use super::verifier::{CheckinError, CheckinVerifier};

pub const DEFAULT_HALT_AFTER_FAILURES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Verdict(ScanVerdict),
    Failed(CheckinError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Scanning,
    Verifying,
    ShowingResult(ScanOutcome),
    AccessDenied,
    Halted(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub accepted: u64,
    pub rejected: u64,
    pub failures: u64,
}

/// What the operator's screen shows for the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// One operator's scanner. Holds at most one verification in flight.
pub struct ScanSession {
    verifier: Arc<CheckinVerifier>,
    role: Role,
    state: SessionState,
    counters: SessionCounters,
    consecutive_failures: u32,
    halt_after_failures: u32,
}

impl ScanSession {
    /// Students never reach `Scanning`.
    #[must_use]
    pub fn open(verifier: Arc<CheckinVerifier>, role: Role) -> Self {
        let state = if role.can_scan() {
            SessionState::Scanning
        } else {
            warn!(role = %role, "scanner opened without scan permission");
            SessionState::AccessDenied
        };
        Self {
            verifier,
            role,
            state,
            counters: SessionCounters::default(),
            consecutive_failures: 0,
            halt_after_failures: DEFAULT_HALT_AFTER_FAILURES,
        }
    }

    #[must_use]
    pub fn with_halt_after_failures(mut self, n: u32) -> Self {
        self.halt_after_failures = n.max(1);
        self
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        matches!(self.state, SessionState::Halted(_))
    }

    /// Feeds one decoded QR payload. Returns `None` when the event was
    /// suppressed because the session is not `Scanning`.
    pub async fn on_decode(&mut self, text: &str) -> Option<ScanOutcome> {
        if self.state != SessionState::Scanning {
            return None;
        }
        self.state = SessionState::Verifying;
        let outcome = match self.verifier.verify(text, self.role).await {
            Ok(verdict) => {
                self.consecutive_failures = 0;
                if verdict.is_accepted() {
                    self.counters.accepted += 1;
                } else {
                    self.counters.rejected += 1;
                }
                ScanOutcome::Verdict(verdict)
            }
            Err(err) => {
                self.counters.failures += 1;
                ScanOutcome::Failed(err)
            }
        };
        self.state = self.next_state(&outcome);
        Some(outcome)
    }

    fn next_state(&mut self, outcome: &ScanOutcome) -> SessionState {
        let ScanOutcome::Failed(err) = outcome else {
            return SessionState::ShowingResult(outcome.clone());
        };
        if err.is_session_fatal() {
            warn!(error = %err, "scanner halted");
            return SessionState::Halted(err.to_string());
        }
        if let CheckinError::Unauthorized { .. } = err {
            return SessionState::AccessDenied;
        }
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.halt_after_failures {
            warn!(
                failures = self.consecutive_failures,
                "scanner halted after repeated storage failures"
            );
            return SessionState::Halted(format!(
                "{} consecutive storage failures, last: {err}",
                self.consecutive_failures
            ));
        }
        SessionState::ShowingResult(outcome.clone())
    }

    /// Back to `Scanning` from a shown result or an abandoned verification.
    /// Returns whether the state changed.
    pub fn reset(&mut self) -> bool {
        match self.state {
            SessionState::ShowingResult(_) | SessionState::Verifying => {
                self.state = SessionState::Scanning;
                info!("scanner reset");
                true
            }
            SessionState::Scanning | SessionState::AccessDenied | SessionState::Halted(_) => false,
        }
    }

    #[must_use]
    pub fn display(&self) -> DisplayModel {
        match &self.state {
            SessionState::Scanning => DisplayModel {
                headline: None,
                message: "Ready to scan".to_string(),
                details: Vec::new(),
            },
            SessionState::Verifying => DisplayModel {
                headline: None,
                message: "Verifying...".to_string(),
                details: Vec::new(),
            },
            SessionState::ShowingResult(ScanOutcome::Verdict(verdict)) => DisplayModel {
                headline: Some(verdict.headline().to_string()),
                message: verdict.message(),
                details: verdict
                    .attendee()
                    .map(|a| {
                        a.event_title
                            .iter()
                            .chain(a.college_code.iter())
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            SessionState::ShowingResult(ScanOutcome::Failed(err)) => DisplayModel {
                headline: Some("ACCESS DENIED".to_string()),
                message: failure_message(err).to_string(),
                details: Vec::new(),
            },
            SessionState::AccessDenied => DisplayModel {
                headline: Some("ACCESS DENIED".to_string()),
                message: "Scanner requires a club or college admin role".to_string(),
                details: Vec::new(),
            },
            SessionState::Halted(reason) => DisplayModel {
                headline: Some("ACCESS DENIED".to_string()),
                message: format!("Scanner halted: {reason}"),
                details: Vec::new(),
            },
        }
    }
}

fn failure_message(err: &CheckinError) -> &'static str {
    match err {
        CheckinError::StorageTimeout { .. } => "Storage timeout, please scan again",
        CheckinError::StorageUnavailable(_) => "Storage unavailable, please scan again",
        CheckinError::StorageDisconnected(_) => "Storage disconnected",
        CheckinError::Unauthorized { .. } => "Scanner requires a club or college admin role",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_checkin_model::{EventId, TicketCodec, UserId};
    use campus_checkin_store::{InMemoryLedger, RegistrationLedger, StoreErrorCode};
    use chrono::Utc;

    async fn setup() -> (Arc<InMemoryLedger>, Arc<CheckinVerifier>, String) {
        let store = Arc::new(InMemoryLedger::default());
        let event = EventId::parse("E1").expect("event");
        let student = UserId::parse("S1").expect("student");
        store
            .create_registration(&event, &student, Utc::now())
            .await
            .expect("register");
        let credential = TicketCodec::unsigned()
            .encode_at(&event, &student, None, Utc::now())
            .expect("encode");
        let verifier = Arc::new(CheckinVerifier::new(
            store.clone(),
            store.clone(),
            TicketCodec::unsigned(),
        ));
        (store, verifier, credential)
    }

    #[tokio::test]
    async fn decode_events_are_suppressed_until_reset() {
        let (store, verifier, credential) = setup().await;
        let mut session = ScanSession::open(verifier, Role::ClubAdmin);
        assert_eq!(session.display().message, "Ready to scan");

        let first = session.on_decode(&credential).await.expect("handled");
        assert!(matches!(first, ScanOutcome::Verdict(ref v) if v.is_accepted()));
        let calls = store.ledger_calls();

        assert!(session.on_decode(&credential).await.is_none());
        assert!(session.on_decode("not-json").await.is_none());
        assert_eq!(store.ledger_calls(), calls);
        assert_eq!(session.display().headline.as_deref(), Some("ACCESS GRANTED"));

        assert!(session.reset());
        assert!(!session.reset());
        let second = session.on_decode(&credential).await.expect("handled");
        assert!(matches!(second, ScanOutcome::Verdict(ref v) if !v.is_accepted()));
        assert_eq!(
            session.counters(),
            SessionCounters {
                accepted: 1,
                rejected: 1,
                failures: 0
            }
        );
    }

    #[tokio::test]
    async fn student_session_is_access_denied() {
        let (store, verifier, credential) = setup().await;
        let mut session = ScanSession::open(verifier, Role::Student);
        assert_eq!(session.state(), &SessionState::AccessDenied);
        assert!(session.on_decode(&credential).await.is_none());
        assert!(!session.reset());
        assert_eq!(store.ledger_calls(), 1);
        assert_eq!(session.display().headline.as_deref(), Some("ACCESS DENIED"));
    }

    #[tokio::test]
    async fn disconnect_halts_immediately() {
        let (store, verifier, credential) = setup().await;
        store.inject_fault(Some(StoreErrorCode::Disconnected)).await;
        let mut session = ScanSession::open(verifier, Role::CollegeAdmin);
        let outcome = session.on_decode(&credential).await.expect("handled");
        assert!(matches!(outcome, ScanOutcome::Failed(ref e) if e.is_session_fatal()));
        assert!(session.is_halted());
        assert!(!session.reset());
        assert!(session.on_decode(&credential).await.is_none());
        assert!(session.display().message.starts_with("Scanner halted:"));
    }

    #[tokio::test]
    async fn repeated_unavailable_failures_halt() {
        let (store, verifier, credential) = setup().await;
        store.inject_fault(Some(StoreErrorCode::Unavailable)).await;
        let mut session = ScanSession::open(verifier, Role::ClubAdmin).with_halt_after_failures(2);

        session.on_decode(&credential).await.expect("handled");
        assert_eq!(
            session.display().message,
            "Storage unavailable, please scan again"
        );
        assert!(session.reset());
        session.on_decode(&credential).await.expect("handled");
        assert!(session.is_halted());
        assert_eq!(session.counters().failures, 2);
    }

    #[tokio::test]
    async fn a_verdict_clears_the_failure_streak() {
        let (store, verifier, credential) = setup().await;
        let mut session = ScanSession::open(verifier, Role::ClubAdmin).with_halt_after_failures(2);
        store.inject_fault(Some(StoreErrorCode::Unavailable)).await;
        session.on_decode(&credential).await.expect("handled");
        session.reset();
        store.inject_fault(None).await;
        session.on_decode(&credential).await.expect("handled");
        session.reset();
        store.inject_fault(Some(StoreErrorCode::Unavailable)).await;
        session.on_decode(&credential).await.expect("handled");
        assert!(!session.is_halted());
    }
}
