// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EventId, UserId, ValidationError};
use crate::role::Role;

pub const TITLE_MAX_LEN: usize = 200;
pub const NAME_MAX_LEN: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum EventStatus {
    Open,
    Closed,
}

impl EventStatus {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(ValidationError(format!("unknown event status: {other}"))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Event row as exposed by the hosted store. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub status: EventStatus,
}

impl EventRecord {
    pub fn new(
        id: EventId,
        title: &str,
        venue: &str,
        starts_at: DateTime<Utc>,
        status: EventStatus,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            title: bounded_text("event title", title, TITLE_MAX_LEN)?,
            venue: venue.trim().to_string(),
            starts_at,
            status,
        })
    }

    #[must_use]
    pub fn accepts_registrations(&self) -> bool {
        self.status == EventStatus::Open
    }
}

/// Profile row of an authenticated user. Role assignment happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Profile {
    pub id: UserId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college_code: Option<String>,
    pub role: Role,
}

impl Profile {
    pub fn new(
        id: UserId,
        full_name: &str,
        college_code: Option<&str>,
        role: Role,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            full_name: bounded_text("full name", full_name, NAME_MAX_LEN)?,
            college_code: college_code
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(ToString::to_string),
            role,
        })
    }
}

fn bounded_text(kind: &str, input: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{kind} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError(format!("{kind} exceeds max length {max}")));
    }
    Ok(trimmed.to_string())
}
