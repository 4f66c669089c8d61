// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::directory::{EventRecord, Profile};
use crate::ids::{EventId, StudentId};

/// Who was checked in, as shown to the door operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttendeeSummary {
    pub student_id: StudentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college_code: Option<String>,
    pub event_id: EventId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_title: Option<String>,
}

impl AttendeeSummary {
    /// Missing directory rows fall back to the bare identifiers.
    #[must_use]
    pub fn resolve(
        event_id: &EventId,
        student_id: &StudentId,
        event: Option<&EventRecord>,
        profile: Option<&Profile>,
    ) -> Self {
        Self {
            student_id: student_id.clone(),
            full_name: profile.map(|p| p.full_name.clone()),
            college_code: profile.and_then(|p| p.college_code.clone()),
            event_id: event_id.clone(),
            event_title: event.map(|e| e.title.clone()),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .unwrap_or_else(|| self.student_id.as_str())
    }
}

/// Outcome of one scan. Rejections are values here, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanVerdict {
    Accepted {
        attendee: AttendeeSummary,
    },
    AlreadyUsed {
        attendee: AttendeeSummary,
    },
    #[serde(rename_all = "camelCase")]
    NotRegistered {
        event_id: EventId,
        student_id: StudentId,
    },
    Malformed {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictKind {
    Accepted,
    AlreadyUsed,
    NotRegistered,
    Malformed,
}

impl VerdictKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::AlreadyUsed => "ALREADY_USED",
            Self::NotRegistered => "NOT_REGISTERED",
            Self::Malformed => "MALFORMED",
        }
    }
}

impl Display for VerdictKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScanVerdict {
    #[must_use]
    pub const fn kind(&self) -> VerdictKind {
        match self {
            Self::Accepted { .. } => VerdictKind::Accepted,
            Self::AlreadyUsed { .. } => VerdictKind::AlreadyUsed,
            Self::NotRegistered { .. } => VerdictKind::NotRegistered,
            Self::Malformed { .. } => VerdictKind::Malformed,
        }
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    #[must_use]
    pub fn attendee(&self) -> Option<&AttendeeSummary> {
        match self {
            Self::Accepted { attendee } | Self::AlreadyUsed { attendee } => Some(attendee),
            Self::NotRegistered { .. } | Self::Malformed { .. } => None,
        }
    }

    #[must_use]
    pub const fn headline(&self) -> &'static str {
        if self.is_accepted() {
            "ACCESS GRANTED"
        } else {
            "ACCESS DENIED"
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Accepted { attendee } => format!("Verified: {}", attendee.display_name()),
            Self::AlreadyUsed { attendee } => {
                format!("ALREADY SCANNED: {}", attendee.display_name())
            }
            Self::NotRegistered { .. } => "Registration not found".to_string(),
            Self::Malformed { .. } => "Invalid QR code format".to_string(),
        }
    }
}
