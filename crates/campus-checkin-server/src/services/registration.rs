// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use campus_checkin_model::{
    AttendanceCounts, EventId, EventRecord, Profile, Registration, StudentId, TicketCodec, UserId,
};
use campus_checkin_store::{CampusDirectory, RegistrationLedger, StoreErrorCode};
use chrono::Utc;
use tracing::{info, warn};

use super::{bounded, LedgerFault};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    EventNotFound(EventId),
    EventClosed(EventId),
    ProfileNotFound(UserId),
    DuplicateRegistration {
        event_id: EventId,
        student_id: StudentId,
    },
    NotRegistered {
        event_id: EventId,
        student_id: StudentId,
    },
    TicketEncoding(String),
    StorageUnavailable(String),
    StorageTimeout {
        timeout_ms: u64,
    },
    StorageDisconnected(String),
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::EventClosed(id) => write!(f, "event is closed for registration: {id}"),
            Self::ProfileNotFound(id) => write!(f, "profile not found: {id}"),
            Self::DuplicateRegistration {
                event_id,
                student_id,
            } => write!(f, "{student_id} is already registered for {event_id}"),
            Self::NotRegistered {
                event_id,
                student_id,
            } => write!(f, "{student_id} is not registered for {event_id}"),
            Self::TicketEncoding(msg) => write!(f, "ticket encoding failed: {msg}"),
            Self::StorageUnavailable(msg) => write!(f, "storage unavailable: {msg}"),
            Self::StorageTimeout { timeout_ms } => {
                write!(f, "storage timed out after {timeout_ms}ms")
            }
            Self::StorageDisconnected(msg) => write!(f, "storage disconnected: {msg}"),
        }
    }
}

impl std::error::Error for RegistrationError {}

impl From<LedgerFault> for RegistrationError {
    fn from(fault: LedgerFault) -> Self {
        match fault {
            LedgerFault::Timeout { timeout_ms } => Self::StorageTimeout { timeout_ms },
            f if f.is_disconnect() => Self::StorageDisconnected(f.to_string()),
            LedgerFault::Store(e) => Self::StorageUnavailable(e.to_string()),
        }
    }
}

/// Issued credential with the flag telling whether it carries a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTicket {
    pub event_id: EventId,
    pub student_id: StudentId,
    pub credential: String,
    pub signed: bool,
}

/// Student-facing registration flow and the operator attendance view.
pub struct RegistrationService {
    ledger: Arc<dyn RegistrationLedger>,
    directory: Arc<dyn CampusDirectory>,
    codec: TicketCodec,
    ledger_timeout: Duration,
}

impl RegistrationService {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn RegistrationLedger>,
        directory: Arc<dyn CampusDirectory>,
        codec: TicketCodec,
        ledger_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            directory,
            codec,
            ledger_timeout,
        }
    }

    pub async fn caller_profile(&self, user_id: &UserId) -> Result<Profile, RegistrationError> {
        bounded(self.ledger_timeout, self.directory.profile(user_id))
            .await?
            .ok_or_else(|| RegistrationError::ProfileNotFound(user_id.clone()))
    }

    pub async fn event(&self, event_id: &EventId) -> Result<EventRecord, RegistrationError> {
        bounded(self.ledger_timeout, self.directory.event(event_id))
            .await?
            .ok_or_else(|| RegistrationError::EventNotFound(event_id.clone()))
    }

    /// Creates the single registration row for the pair.
    pub async fn register(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
    ) -> Result<Registration, RegistrationError> {
        let event = self.event(event_id).await?;
        if !event.accepts_registrations() {
            return Err(RegistrationError::EventClosed(event_id.clone()));
        }
        self.caller_profile(student_id).await?;

        let created = bounded(
            self.ledger_timeout,
            self.ledger
                .create_registration(event_id, student_id, Utc::now()),
        )
        .await;
        match created {
            Ok(row) => {
                info!(registration_id = %row.id, "registration created");
                Ok(row)
            }
            Err(LedgerFault::Store(e)) if e.code == StoreErrorCode::Duplicate => {
                warn!(event_id = %event_id, student_id = %student_id, "duplicate registration");
                Err(RegistrationError::DuplicateRegistration {
                    event_id: event_id.clone(),
                    student_id: student_id.clone(),
                })
            }
            Err(fault) => Err(fault.into()),
        }
    }

    /// Credential text for an existing registration.
    pub async fn ticket_for(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
    ) -> Result<IssuedTicket, RegistrationError> {
        let row = bounded(
            self.ledger_timeout,
            self.ledger.get_registration(event_id, student_id),
        )
        .await?
        .ok_or_else(|| RegistrationError::NotRegistered {
            event_id: event_id.clone(),
            student_id: student_id.clone(),
        })?;
        let name = match bounded(self.ledger_timeout, self.directory.profile(student_id)).await {
            Ok(profile) => profile.map(|p| p.full_name),
            Err(_) => None,
        };
        let credential = self
            .codec
            .encode(&row, name.as_deref())
            .map_err(|e| RegistrationError::TicketEncoding(e.0))?;
        Ok(IssuedTicket {
            event_id: row.event_id,
            student_id: row.student_id,
            credential,
            signed: self.codec.is_signing(),
        })
    }

    pub async fn list_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Registration>, RegistrationError> {
        Ok(bounded(self.ledger_timeout, self.ledger.list_for_student(student_id)).await?)
    }

    pub async fn attendance(
        &self,
        event_id: &EventId,
    ) -> Result<AttendanceCounts, RegistrationError> {
        self.event(event_id).await?;
        Ok(bounded(self.ledger_timeout, self.ledger.attendance_counts(event_id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_checkin_model::{EventStatus, Role};
    use campus_checkin_store::InMemoryLedger;

    async fn service(status: EventStatus) -> (Arc<InMemoryLedger>, RegistrationService) {
        let store = Arc::new(InMemoryLedger::default());
        store
            .put_event(
                EventRecord::new(
                    EventId::parse("E1").expect("event"),
                    "Spring Hackathon",
                    "Main Hall",
                    Utc::now(),
                    status,
                )
                .expect("event"),
            )
            .await;
        store
            .put_profile(
                Profile::new(
                    UserId::parse("S1").expect("user"),
                    "Asha Verma",
                    None,
                    Role::Student,
                )
                .expect("profile"),
            )
            .await;
        let svc = RegistrationService::new(
            store.clone(),
            store.clone(),
            TicketCodec::unsigned(),
            Duration::from_secs(1),
        );
        (store, svc)
    }

    #[tokio::test]
    async fn second_registration_is_duplicate() {
        let (_, svc) = service(EventStatus::Open).await;
        let event = EventId::parse("E1").expect("event");
        let student = UserId::parse("S1").expect("student");
        svc.register(&event, &student).await.expect("first");
        let err = svc.register(&event, &student).await.expect_err("second");
        assert!(matches!(err, RegistrationError::DuplicateRegistration { .. }));
    }

    #[tokio::test]
    async fn closed_and_unknown_events_are_rejected() {
        let (store, svc) = service(EventStatus::Closed).await;
        let student = UserId::parse("S1").expect("student");
        let err = svc
            .register(&EventId::parse("E1").expect("event"), &student)
            .await
            .expect_err("closed");
        assert!(matches!(err, RegistrationError::EventClosed(_)));
        let err = svc
            .register(&EventId::parse("E9").expect("event"), &student)
            .await
            .expect_err("unknown");
        assert!(matches!(err, RegistrationError::EventNotFound(_)));
        assert_eq!(store.ledger_calls(), 0);
    }

    #[tokio::test]
    async fn ticket_needs_a_registration_and_carries_the_name() {
        let (_, svc) = service(EventStatus::Open).await;
        let event = EventId::parse("E1").expect("event");
        let student = UserId::parse("S1").expect("student");
        let err = svc.ticket_for(&event, &student).await.expect_err("none");
        assert!(matches!(err, RegistrationError::NotRegistered { .. }));

        svc.register(&event, &student).await.expect("register");
        let ticket = svc.ticket_for(&event, &student).await.expect("ticket");
        assert!(ticket.credential.contains("\"studentName\":\"Asha Verma\""));
        assert!(!ticket.signed);

        let counts = svc.attendance(&event).await.expect("counts");
        assert_eq!(counts.registered, 1);
        assert_eq!(counts.attended, 0);
    }
}
