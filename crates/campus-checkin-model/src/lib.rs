// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Campus check-in model SSOT.
//!
//! ```compile_fail
//! use campus_checkin_model::Role;
//!
//! fn exhaustive_match(r: Role) -> &'static str {
//!     match r {
//!         Role::Student => "s",
//!         Role::ClubAdmin => "c",
//!         Role::CollegeAdmin => "a",
//!     }
//! }
//! ```

mod directory;
mod ids;
mod registration;
mod role;
mod ticket;
mod verdict;

pub use directory::{EventRecord, EventStatus, Profile, NAME_MAX_LEN, TITLE_MAX_LEN};
pub use ids::{EventId, RegistrationId, StudentId, UserId, ValidationError, ID_MAX_LEN};
pub use registration::{AttendanceCounts, Registration, RegistrationStatus};
pub use role::{can_scan, Role};
pub use ticket::{
    MalformedCredential, TicketClaims, TicketCodec, TicketCredential, TicketEncodeError,
    MAX_CREDENTIAL_BYTES,
};
pub use verdict::{AttendeeSummary, ScanVerdict, VerdictKind};

pub const CRATE_NAME: &str = "campus-checkin-model";
