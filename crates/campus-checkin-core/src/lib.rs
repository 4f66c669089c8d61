// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};

pub mod canonical;
mod error;
pub mod signing;

pub use error::{ExitCode, MachineError};

pub const CRATE_NAME: &str = "campus-checkin-core";

pub const ENV_CHECKIN_BIND: &str = "CHECKIN_BIND";
pub const ENV_CHECKIN_DB_PATH: &str = "CHECKIN_DB_PATH";
pub const ENV_CHECKIN_TICKET_SECRET: &str = "CHECKIN_TICKET_SECRET";
pub const ENV_CHECKIN_LOG_JSON: &str = "CHECKIN_LOG_JSON";

pub const DEFAULT_DB_PATH: &str = "campus-checkin.sqlite";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[must_use]
pub fn resolve_db_path() -> std::path::PathBuf {
    if let Ok(explicit) = std::env::var(ENV_CHECKIN_DB_PATH) {
        let trimmed = explicit.trim();
        if !trimmed.is_empty() {
            return std::path::PathBuf::from(trimmed);
        }
    }
    std::path::PathBuf::from(DEFAULT_DB_PATH)
}
