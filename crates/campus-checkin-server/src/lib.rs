// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Check-in verifier, scan session controller and the HTTP service around them.

mod config;
mod http;
mod middleware;
mod runtime;
pub mod services;

pub use config::{
    validate_startup_config_contract, ApiConfig, CONFIG_SCHEMA_VERSION, ENV_HALT_AFTER_FAILURES,
    ENV_LEDGER_TIMEOUT_MS, ENV_MAX_BODY_BYTES, ENV_REQUEST_TIMEOUT_MS,
    ENV_REQUIRE_SIGNED_TICKETS, ENV_SHUTDOWN_DRAIN_MS,
};
pub use runtime::server_runtime_app::{build_router, AppState};
pub use services::registration::{IssuedTicket, RegistrationError, RegistrationService};
pub use services::session::{
    DisplayModel, ScanOutcome, ScanSession, SessionCounters, SessionState,
    DEFAULT_HALT_AFTER_FAILURES,
};
pub use services::verifier::{CheckinError, CheckinVerifier};
pub use services::LedgerFault;

pub const CRATE_NAME: &str = "campus-checkin-server";
