// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Registration ledger backends.

mod error;
mod ledger;
mod memory;
mod sqlite;

pub use error::{StoreError, StoreErrorCode};
pub use ledger::{CampusDirectory, RegistrationLedger};
pub use memory::InMemoryLedger;
pub use sqlite::{SqliteLedger, SCHEMA_VERSION};

pub const CRATE_NAME: &str = "campus-checkin-store";
