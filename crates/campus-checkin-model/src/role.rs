// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::ValidationError;

/// Role value as stored on the user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Role {
    Student,
    ClubAdmin,
    CollegeAdmin,
}

impl Role {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "student" => Ok(Self::Student),
            "club_admin" => Ok(Self::ClubAdmin),
            "college_admin" => Ok(Self::CollegeAdmin),
            other => Err(ValidationError(format!("unknown role: {other}"))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::ClubAdmin => "club_admin",
            Self::CollegeAdmin => "college_admin",
        }
    }

    #[must_use]
    pub const fn can_scan(self) -> bool {
        can_scan(self)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single scanner permission check. Every layer that gates check-in asks
/// this predicate; club and institution staff may scan, students may not.
#[must_use]
pub const fn can_scan(role: Role) -> bool {
    !matches!(role, Role::Student)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_staff_roles_may_scan() {
        assert!(!can_scan(Role::Student));
        assert!(can_scan(Role::ClubAdmin));
        assert!(can_scan(Role::CollegeAdmin));
    }

    #[test]
    fn role_strings_round_trip() {
        for role in [Role::Student, Role::ClubAdmin, Role::CollegeAdmin] {
            assert_eq!(Role::parse(role.as_str()), Ok(role));
        }
        assert!(Role::parse("faculty").is_err());
    }
}
