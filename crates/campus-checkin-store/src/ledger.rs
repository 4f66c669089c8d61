// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use campus_checkin_model::{
    AttendanceCounts, EventId, EventRecord, Profile, Registration, RegistrationId, StudentId,
    UserId,
};
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Authoritative registration rows, one per (event, student) pair.
///
/// `mark_attended` is the only mutation after creation and must be a
/// compare-and-set on `status = registered`: of any number of concurrent
/// callers for the same row exactly one observes `true`.
#[async_trait]
pub trait RegistrationLedger: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str {
        "unknown"
    }

    /// Fails with [`crate::StoreErrorCode::Duplicate`] when the pair exists.
    async fn create_registration(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
        registered_at: DateTime<Utc>,
    ) -> Result<Registration, StoreError>;

    async fn get_registration(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
    ) -> Result<Option<Registration>, StoreError>;

    async fn mark_attended(
        &self,
        id: &RegistrationId,
        attended_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn list_for_student(&self, student_id: &StudentId)
        -> Result<Vec<Registration>, StoreError>;

    async fn list_for_event(&self, event_id: &EventId) -> Result<Vec<Registration>, StoreError>;

    async fn attendance_counts(&self, event_id: &EventId) -> Result<AttendanceCounts, StoreError> {
        let mut counts = AttendanceCounts::default();
        for row in self.list_for_event(event_id).await? {
            counts.observe(row.status);
        }
        Ok(counts)
    }

    /// Cheap round trip used by readiness checks.
    async fn probe(&self) -> Result<(), StoreError>;
}

/// Read access to the hosted event and profile tables.
#[async_trait]
pub trait CampusDirectory: Send + Sync + 'static {
    async fn event(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError>;
    async fn profile(&self, id: &UserId) -> Result<Option<Profile>, StoreError>;
}
