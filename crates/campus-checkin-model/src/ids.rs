// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use campus_checkin_core::sha256_hex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const ID_MAX_LEN: usize = 128;

/// Opaque event identifier issued by the hosted store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

/// Opaque identifier of an authenticated user (students and staff alike).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// A student is a user holding a registration.
pub type StudentId = UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistrationId(String);

impl EventId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        validate_id("event id", input)?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        validate_id("user id", input)?;
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RegistrationId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        validate_id("registration id", input)?;
        Ok(Self(input.to_string()))
    }

    /// Deterministic id for an (event, student) pair; one pair maps to one row.
    #[must_use]
    pub fn for_pair(event_id: &EventId, student_id: &StudentId) -> Self {
        let digest = sha256_hex(format!("{}\0{}", event_id.as_str(), student_id.as_str()).as_bytes());
        Self(format!("reg_{}", &digest[..32]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_id(kind: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError(format!("{kind} must not be empty")));
    }
    if value.len() > ID_MAX_LEN {
        return Err(ValidationError(format!(
            "{kind} exceeds max length {ID_MAX_LEN}"
        )));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ValidationError(format!(
            "{kind} must not contain whitespace or control characters"
        )));
    }
    Ok(())
}

macro_rules! string_conversions {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_conversions!(EventId);
string_conversions!(UserId);
string_conversions!(RegistrationId);
