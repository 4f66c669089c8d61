// SPDX-License-Identifier: Apache-2.0

use campus_checkin_model::{
    AttendanceCounts, AttendeeSummary, EventId, Registration, ScanVerdict, StudentId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::API_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationDto {
    pub id: String,
    pub event_id: String,
    pub student_id: String,
    pub status: String,
    pub registered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attended_at: Option<DateTime<Utc>>,
}

impl From<&Registration> for RegistrationDto {
    fn from(row: &Registration) -> Self {
        Self {
            id: row.id.to_string(),
            event_id: row.event_id.to_string(),
            student_id: row.student_id.to_string(),
            status: row.status.as_str().to_string(),
            registered_at: row.registered_at,
            attended_at: row.attended_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationListDto {
    pub api_version: String,
    pub registrations: Vec<RegistrationDto>,
}

impl RegistrationListDto {
    #[must_use]
    pub fn new(rows: &[Registration]) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            registrations: rows.iter().map(RegistrationDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketDto {
    pub event_id: String,
    pub student_id: String,
    pub credential: String,
    pub signed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttendanceDto {
    pub event_id: String,
    pub registered: u64,
    pub attended: u64,
    pub total: u64,
}

impl AttendanceDto {
    #[must_use]
    pub fn new(event_id: &EventId, counts: AttendanceCounts) -> Self {
        Self {
            event_id: event_id.to_string(),
            registered: counts.registered,
            attended: counts.attended,
            total: counts.total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckinRequestDto {
    pub credential: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttendeeDto {
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college_code: Option<String>,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_title: Option<String>,
}

impl From<&AttendeeSummary> for AttendeeDto {
    fn from(a: &AttendeeSummary) -> Self {
        Self {
            student_id: a.student_id.to_string(),
            full_name: a.full_name.clone(),
            college_code: a.college_code.clone(),
            event_id: a.event_id.to_string(),
            event_title: a.event_title.clone(),
        }
    }
}

/// Body of every check-in answer that produced a verdict, rejections included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckinResponseDto {
    pub api_version: String,
    pub verdict: String,
    pub headline: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee: Option<AttendeeDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&ScanVerdict> for CheckinResponseDto {
    fn from(verdict: &ScanVerdict) -> Self {
        let (event_id, student_id, reason): (Option<&EventId>, Option<&StudentId>, Option<String>) =
            match verdict {
                ScanVerdict::Accepted { attendee } | ScanVerdict::AlreadyUsed { attendee } => {
                    (Some(&attendee.event_id), Some(&attendee.student_id), None)
                }
                ScanVerdict::NotRegistered {
                    event_id,
                    student_id,
                } => (Some(event_id), Some(student_id), None),
                ScanVerdict::Malformed { reason } => (None, None, Some(reason.clone())),
            };
        Self {
            api_version: API_VERSION.to_string(),
            verdict: verdict.kind().as_str().to_string(),
            headline: verdict.headline().to_string(),
            message: verdict.message(),
            attendee: verdict.attendee().map(AttendeeDto::from),
            event_id: event_id.map(ToString::to_string),
            student_id: student_id.map(ToString::to_string),
            reason,
        }
    }
}
