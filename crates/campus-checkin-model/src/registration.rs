// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::{EventId, RegistrationId, StudentId, ValidationError};

/// Attendance state of one (event, student) pair.
///
/// Transitions only `Registered -> Attended`; `Attended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    Attended,
}

impl RegistrationStatus {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "registered" => Ok(Self::Registered),
            "attended" => Ok(Self::Attended),
            other => Err(ValidationError(format!(
                "unknown registration status: {other}"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Attended => "attended",
        }
    }

    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Registered, Self::Attended))
    }
}

impl Display for RegistrationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub student_id: StudentId,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attended_at: Option<DateTime<Utc>>,
}

impl Registration {
    #[must_use]
    pub fn new(event_id: EventId, student_id: StudentId, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: RegistrationId::for_pair(&event_id, &student_id),
            event_id,
            student_id,
            status: RegistrationStatus::Registered,
            registered_at,
            attended_at: None,
        }
    }

    #[must_use]
    pub fn is_attended(&self) -> bool {
        self.status == RegistrationStatus::Attended
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttendanceCounts {
    pub registered: u64,
    pub attended: u64,
}

impl AttendanceCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.registered + self.attended
    }

    pub fn observe(&mut self, status: RegistrationStatus) {
        match status {
            RegistrationStatus::Registered => self.registered += 1,
            RegistrationStatus::Attended => self.attended += 1,
        }
    }
}
