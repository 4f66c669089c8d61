// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use campus_checkin_model::{
    EventId, EventRecord, Profile, Registration, RegistrationId, RegistrationStatus, StudentId,
    UserId,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreErrorCode};
use crate::ledger::{CampusDirectory, RegistrationLedger};

/// In-process ledger and directory for tests and demos.
///
/// Counts every ledger and directory call, can delay each ledger call, and
/// can be switched into a failure mode where every call returns the injected
/// error code.
pub struct InMemoryLedger {
    registrations: Mutex<HashMap<RegistrationId, Registration>>,
    events: Mutex<HashMap<EventId, EventRecord>>,
    profiles: Mutex<HashMap<UserId, Profile>>,
    fault: Mutex<Option<StoreErrorCode>>,
    pub create_calls: AtomicU64,
    pub get_calls: AtomicU64,
    pub mark_calls: AtomicU64,
    pub list_calls: AtomicU64,
    pub directory_calls: AtomicU64,
    pub latency: Duration,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self {
            registrations: Mutex::new(HashMap::new()),
            events: Mutex::new(HashMap::new()),
            profiles: Mutex::new(HashMap::new()),
            fault: Mutex::new(None),
            create_calls: AtomicU64::new(0),
            get_calls: AtomicU64::new(0),
            mark_calls: AtomicU64::new(0),
            list_calls: AtomicU64::new(0),
            directory_calls: AtomicU64::new(0),
            latency: Duration::from_millis(0),
        }
    }
}

impl InMemoryLedger {
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn inject_fault(&self, code: Option<StoreErrorCode>) {
        *self.fault.lock().await = code;
    }

    pub async fn put_event(&self, event: EventRecord) {
        self.events.lock().await.insert(event.id.clone(), event);
    }

    pub async fn put_profile(&self, profile: Profile) {
        self.profiles.lock().await.insert(profile.id.clone(), profile);
    }

    /// Calls that touched registration rows.
    #[must_use]
    pub fn ledger_calls(&self) -> u64 {
        self.create_calls.load(Ordering::Relaxed)
            + self.get_calls.load(Ordering::Relaxed)
            + self.mark_calls.load(Ordering::Relaxed)
            + self.list_calls.load(Ordering::Relaxed)
    }

    async fn enter(&self, counter: &AtomicU64) -> Result<(), StoreError> {
        counter.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match *self.fault.lock().await {
            Some(code) => Err(StoreError::new(code, "injected ledger fault")),
            None => Ok(()),
        }
    }

    async fn rows_where<F>(&self, keep: F) -> Vec<Registration>
    where
        F: Fn(&Registration) -> bool,
    {
        let mut rows: Vec<Registration> = self
            .registrations
            .lock()
            .await
            .values()
            .filter(|r| keep(*r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows
    }
}

#[async_trait]
impl RegistrationLedger for InMemoryLedger {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn create_registration(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
        registered_at: DateTime<Utc>,
    ) -> Result<Registration, StoreError> {
        self.enter(&self.create_calls).await?;
        let registration = Registration::new(event_id.clone(), student_id.clone(), registered_at);
        let mut rows = self.registrations.lock().await;
        if rows.contains_key(&registration.id) {
            return Err(StoreError::new(
                StoreErrorCode::Duplicate,
                format!("registration already exists for event {event_id} and student {student_id}"),
            ));
        }
        rows.insert(registration.id.clone(), registration.clone());
        Ok(registration)
    }

    async fn get_registration(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
    ) -> Result<Option<Registration>, StoreError> {
        self.enter(&self.get_calls).await?;
        let id = RegistrationId::for_pair(event_id, student_id);
        Ok(self.registrations.lock().await.get(&id).cloned())
    }

    async fn mark_attended(
        &self,
        id: &RegistrationId,
        attended_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.enter(&self.mark_calls).await?;
        let mut rows = self.registrations.lock().await;
        match rows.get_mut(id) {
            Some(row) if row.status.can_transition_to(RegistrationStatus::Attended) => {
                row.status = RegistrationStatus::Attended;
                row.attended_at = Some(attended_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Registration>, StoreError> {
        self.enter(&self.list_calls).await?;
        Ok(self.rows_where(|r| &r.student_id == student_id).await)
    }

    async fn list_for_event(&self, event_id: &EventId) -> Result<Vec<Registration>, StoreError> {
        self.enter(&self.list_calls).await?;
        Ok(self.rows_where(|r| &r.event_id == event_id).await)
    }

    async fn probe(&self) -> Result<(), StoreError> {
        match *self.fault.lock().await {
            Some(code) => Err(StoreError::new(code, "injected ledger fault")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CampusDirectory for InMemoryLedger {
    async fn event(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        self.directory_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.events.lock().await.get(id).cloned())
    }

    async fn profile(&self, id: &UserId) -> Result<Option<Profile>, StoreError> {
        self.directory_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.profiles.lock().await.get(id).cloned())
    }
}
