// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use campus_checkin_model::{
    AttendeeSummary, EventId, Role, ScanVerdict, StudentId, TicketClaims, TicketCodec,
};
use campus_checkin_store::{CampusDirectory, RegistrationLedger};
use chrono::Utc;
use tracing::{debug, info, warn};

use super::{bounded, LedgerFault};
use crate::config::DEFAULT_LEDGER_TIMEOUT;

/// Failures that prevent a verdict. Rejections of a credential are
/// [`ScanVerdict`] values, never this type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CheckinError {
    Unauthorized { role: Role },
    StorageUnavailable(String),
    StorageTimeout { timeout_ms: u64 },
    StorageDisconnected(String),
}

impl CheckinError {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::StorageTimeout { .. } => "storage_timeout",
            Self::StorageDisconnected(_) => "storage_disconnected",
        }
    }

    /// Whether a rescan of the same credential may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StorageUnavailable(_) | Self::StorageTimeout { .. }
        )
    }

    /// The scanner cannot recover from this without a restart.
    #[must_use]
    pub const fn is_session_fatal(&self) -> bool {
        matches!(self, Self::StorageDisconnected(_))
    }
}

impl std::fmt::Display for CheckinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { role } => write!(f, "role {role} may not scan tickets"),
            Self::StorageUnavailable(msg) => write!(f, "storage unavailable: {msg}"),
            Self::StorageTimeout { timeout_ms } => {
                write!(f, "storage timed out after {timeout_ms}ms")
            }
            Self::StorageDisconnected(msg) => write!(f, "storage disconnected: {msg}"),
        }
    }
}

impl std::error::Error for CheckinError {}

impl From<LedgerFault> for CheckinError {
    fn from(fault: LedgerFault) -> Self {
        match fault {
            LedgerFault::Timeout { timeout_ms } => Self::StorageTimeout { timeout_ms },
            f if f.is_disconnect() => Self::StorageDisconnected(f.to_string()),
            LedgerFault::Store(e) => Self::StorageUnavailable(e.to_string()),
        }
    }
}

/// Turns a scanned credential into a verdict, marking attendance at most once
/// per registration.
pub struct CheckinVerifier {
    ledger: Arc<dyn RegistrationLedger>,
    directory: Arc<dyn CampusDirectory>,
    codec: TicketCodec,
    ledger_timeout: Duration,
    directory_timeout: Duration,
}

impl CheckinVerifier {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn RegistrationLedger>,
        directory: Arc<dyn CampusDirectory>,
        codec: TicketCodec,
    ) -> Self {
        Self {
            ledger,
            directory,
            codec,
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
            directory_timeout: DEFAULT_LEDGER_TIMEOUT / 4,
        }
    }

    #[must_use]
    pub fn with_ledger_timeout(mut self, ledger_timeout: Duration) -> Self {
        self.ledger_timeout = ledger_timeout;
        self
    }

    /// Limit for the event and profile lookups that decorate a verdict.
    #[must_use]
    pub fn with_directory_timeout(mut self, directory_timeout: Duration) -> Self {
        self.directory_timeout = directory_timeout;
        self
    }

    #[must_use]
    pub fn codec(&self) -> &TicketCodec {
        &self.codec
    }

    #[must_use]
    pub fn ledger_timeout(&self) -> Duration {
        self.ledger_timeout
    }

    /// Verifies `credential` on behalf of an operator holding `role`.
    ///
    /// The role gate and the decode both run before any ledger call. The
    /// attendance write is a single compare-and-set, so of any number of
    /// concurrent scans of one ticket exactly one is accepted.
    pub async fn verify(&self, credential: &str, role: Role) -> Result<ScanVerdict, CheckinError> {
        if !role.can_scan() {
            warn!(role = %role, "scan refused for role");
            return Err(CheckinError::Unauthorized { role });
        }

        let claims = match self.codec.decode(credential) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(reason = %e, "credential rejected");
                return Ok(ScanVerdict::Malformed { reason: e.0 });
            }
        };
        let TicketClaims {
            event_id,
            student_id,
        } = claims;

        let row = bounded(
            self.ledger_timeout,
            self.ledger.get_registration(&event_id, &student_id),
        )
        .await
        .map_err(|fault| self.storage_failure("get_registration", fault))?;

        let Some(row) = row else {
            warn!(event_id = %event_id, student_id = %student_id, "no registration for ticket");
            return Ok(ScanVerdict::NotRegistered {
                event_id,
                student_id,
            });
        };

        if row.is_attended() {
            let attendee = self.attendee(&event_id, &student_id).await;
            warn!(registration_id = %row.id, "ticket already used");
            return Ok(ScanVerdict::AlreadyUsed { attendee });
        }

        let applied = bounded(
            self.ledger_timeout,
            self.ledger.mark_attended(&row.id, Utc::now()),
        )
        .await
        .map_err(|fault| self.storage_failure("mark_attended", fault))?;

        let attendee = self.attendee(&event_id, &student_id).await;
        if applied {
            info!(registration_id = %row.id, backend = self.ledger.backend_tag(), "attendance recorded");
            Ok(ScanVerdict::Accepted { attendee })
        } else {
            warn!(registration_id = %row.id, "lost attendance race");
            Ok(ScanVerdict::AlreadyUsed { attendee })
        }
    }

    fn storage_failure(&self, op: &'static str, fault: LedgerFault) -> CheckinError {
        let err = CheckinError::from(fault);
        warn!(op, error = %err, backend = self.ledger.backend_tag(), "ledger call failed");
        err
    }

    /// Directory lookups are best effort and never change the verdict.
    async fn attendee(&self, event_id: &EventId, student_id: &StudentId) -> AttendeeSummary {
        let (event, profile) = tokio::join!(
            bounded(self.directory_timeout, self.directory.event(event_id)),
            bounded(self.directory_timeout, self.directory.profile(student_id)),
        );
        let event = event.unwrap_or_else(|fault| {
            debug!(error = %fault, "event lookup failed");
            None
        });
        let profile = profile.unwrap_or_else(|fault| {
            debug!(error = %fault, "profile lookup failed");
            None
        });
        AttendeeSummary::resolve(event_id, student_id, event.as_ref(), profile.as_ref())
    }
}
