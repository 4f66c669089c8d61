// SPDX-License-Identifier: Apache-2.0

use campus_checkin_core::{
    ENV_CHECKIN_BIND, ENV_CHECKIN_DB_PATH, ENV_CHECKIN_LOG_JSON, ENV_CHECKIN_TICKET_SECRET,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

pub const ENV_MAX_BODY_BYTES: &str = "CHECKIN_MAX_BODY_BYTES";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CHECKIN_REQUEST_TIMEOUT_MS";
pub const ENV_LEDGER_TIMEOUT_MS: &str = "CHECKIN_LEDGER_TIMEOUT_MS";
pub const ENV_REQUIRE_SIGNED_TICKETS: &str = "CHECKIN_REQUIRE_SIGNED_TICKETS";
pub const ENV_HALT_AFTER_FAILURES: &str = "CHECKIN_HALT_AFTER_FAILURES";
pub const ENV_SHUTDOWN_DRAIN_MS: &str = "CHECKIN_SHUTDOWN_DRAIN_MS";

pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_millis(1000);

/// Ledger calls a check-in makes up to and including the attendance write:
/// caller profile, registration read, conditional update.
const CHECKIN_CALLS_THROUGH_WRITE: u32 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub bind: String,
    pub db_path: PathBuf,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    pub ledger_timeout: Duration,
    #[serde(skip_serializing)]
    pub ticket_secret: Option<String>,
    pub require_signed_tickets: bool,
    pub halt_after_failures: u32,
    pub log_json: bool,
    pub shutdown_drain: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            db_path: PathBuf::from(campus_checkin_core::DEFAULT_DB_PATH),
            max_body_bytes: 4096,
            request_timeout: Duration::from_millis(5000),
            ledger_timeout: DEFAULT_LEDGER_TIMEOUT,
            ticket_secret: None,
            require_signed_tickets: false,
            halt_after_failures: 3,
            log_json: true,
            shutdown_drain: Duration::from_millis(2000),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl ApiConfig {
    /// Reads every `CHECKIN_*` setting from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from `lookup`, keeping the default for any variable
    /// that is unset or does not parse.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |name: &str| text(name).and_then(|v| v.parse::<u64>().ok());
        let millis = |name: &str, default: Duration| {
            number(name).map_or(default, Duration::from_millis)
        };
        let flag = |name: &str, default: bool| {
            text(name)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };

        Self {
            bind: text(ENV_CHECKIN_BIND).unwrap_or(defaults.bind),
            db_path: text(ENV_CHECKIN_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            max_body_bytes: number(ENV_MAX_BODY_BYTES)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.max_body_bytes),
            request_timeout: millis(ENV_REQUEST_TIMEOUT_MS, defaults.request_timeout),
            ledger_timeout: millis(ENV_LEDGER_TIMEOUT_MS, defaults.ledger_timeout),
            ticket_secret: text(ENV_CHECKIN_TICKET_SECRET),
            require_signed_tickets: flag(
                ENV_REQUIRE_SIGNED_TICKETS,
                defaults.require_signed_tickets,
            ),
            halt_after_failures: number(ENV_HALT_AFTER_FAILURES).map_or(
                defaults.halt_after_failures,
                |v| u32::try_from(v).unwrap_or(u32::MAX),
            ),
            log_json: flag(ENV_CHECKIN_LOG_JSON, defaults.log_json),
            shutdown_drain: millis(ENV_SHUTDOWN_DRAIN_MS, defaults.shutdown_drain),
        }
    }

    /// Budget for the best-effort event and profile lookups that decorate a
    /// verdict. Both run concurrently under this one limit.
    #[must_use]
    pub fn directory_timeout(&self) -> Duration {
        self.ledger_timeout / 4
    }

    /// Worst-case time a check-in spends in storage.
    #[must_use]
    pub fn checkin_budget(&self) -> Duration {
        self.ledger_timeout
            .saturating_mul(CHECKIN_CALLS_THROUGH_WRITE)
            .saturating_add(self.directory_timeout())
    }

    #[must_use]
    pub fn ticket_codec(&self) -> campus_checkin_model::TicketCodec {
        match self.ticket_secret.as_deref() {
            Some(secret) if !secret.is_empty() => campus_checkin_model::TicketCodec::signed(
                secret.as_bytes().to_vec(),
                self.require_signed_tickets,
            ),
            _ => campus_checkin_model::TicketCodec::unsigned(),
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("api size limits must be > 0".to_string());
    }
    if api.request_timeout.is_zero() || api.ledger_timeout.is_zero() {
        return Err("timeouts must be > 0".to_string());
    }
    if api.checkin_budget() >= api.request_timeout {
        return Err(format!(
            "request timeout {}ms must exceed the check-in storage budget {}ms",
            api.request_timeout.as_millis(),
            api.checkin_budget().as_millis()
        ));
    }
    if api.halt_after_failures == 0 {
        return Err("halt_after_failures must be >= 1".to_string());
    }
    if api.require_signed_tickets && api.ticket_secret.as_deref().is_none_or(str::is_empty) {
        return Err("require_signed_tickets=true requires a non-empty ticket secret".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_passes_startup_validation() {
        validate_startup_config_contract(&ApiConfig::default()).expect("default config");
    }

    #[test]
    fn required_signatures_need_a_secret() {
        let api = ApiConfig {
            require_signed_tickets: true,
            ticket_secret: Some(String::new()),
            ..ApiConfig::default()
        };
        let err = validate_startup_config_contract(&api).expect_err("missing secret");
        assert!(err.contains("ticket secret"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let api = ApiConfig {
            halt_after_failures: 0,
            ..ApiConfig::default()
        };
        assert!(validate_startup_config_contract(&api).is_err());
        let api = ApiConfig {
            ledger_timeout: Duration::ZERO,
            ..ApiConfig::default()
        };
        assert!(validate_startup_config_contract(&api).is_err());
    }

    #[test]
    fn secret_is_not_serialized() {
        let api = ApiConfig {
            ticket_secret: Some("hunter2".to_string()),
            ..ApiConfig::default()
        };
        let text = serde_json::to_string(&api).expect("serialize");
        assert!(!text.contains("hunter2"));
        assert!(text.contains("\"halt_after_failures\":3"));
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn unset_environment_yields_defaults() {
        let api = ApiConfig::from_lookup(lookup(&[]));
        let defaults = ApiConfig::default();
        assert_eq!(api.bind, defaults.bind);
        assert_eq!(api.db_path, defaults.db_path);
        assert_eq!(api.ledger_timeout, DEFAULT_LEDGER_TIMEOUT);
        assert_eq!(api.halt_after_failures, defaults.halt_after_failures);
        assert!(api.log_json);
        assert!(api.ticket_secret.is_none());
    }

    #[test]
    fn environment_overrides_and_bad_values_fall_back() {
        let api = ApiConfig::from_lookup(lookup(&[
            (ENV_CHECKIN_BIND, "127.0.0.1:9000"),
            (ENV_CHECKIN_DB_PATH, " /tmp/door.sqlite "),
            (ENV_LEDGER_TIMEOUT_MS, "250"),
            (ENV_REQUEST_TIMEOUT_MS, "soon"),
            (ENV_HALT_AFTER_FAILURES, "7"),
            (ENV_CHECKIN_LOG_JSON, "false"),
            (ENV_REQUIRE_SIGNED_TICKETS, "maybe"),
            (ENV_CHECKIN_TICKET_SECRET, "   "),
        ]));
        assert_eq!(api.bind, "127.0.0.1:9000");
        assert_eq!(api.db_path, PathBuf::from("/tmp/door.sqlite"));
        assert_eq!(api.ledger_timeout, Duration::from_millis(250));
        assert_eq!(api.request_timeout, ApiConfig::default().request_timeout);
        assert_eq!(api.halt_after_failures, 7);
        assert!(!api.log_json);
        assert!(!api.require_signed_tickets);
        assert!(api.ticket_secret.is_none());
    }

    #[test]
    fn checkin_budget_must_fit_inside_the_request_timeout() {
        let api = ApiConfig::default();
        assert!(api.checkin_budget() < api.request_timeout);

        let api = ApiConfig {
            ledger_timeout: Duration::from_millis(2000),
            request_timeout: Duration::from_millis(5000),
            ..ApiConfig::default()
        };
        assert_eq!(api.checkin_budget(), Duration::from_millis(6500));
        let err = validate_startup_config_contract(&api).expect_err("budget too large");
        assert!(err.contains("check-in storage budget"));

        let api = ApiConfig {
            ledger_timeout: Duration::from_millis(1200),
            request_timeout: Duration::from_millis(3900),
            ..ApiConfig::default()
        };
        assert_eq!(api.checkin_budget(), Duration::from_millis(3900));
        assert!(validate_startup_config_contract(&api).is_err());
    }

    #[test]
    fn codec_signs_only_with_a_secret() {
        assert!(!ApiConfig::default().ticket_codec().is_signing());
        let api = ApiConfig {
            ticket_secret: Some("k".to_string()),
            ..ApiConfig::default()
        };
        assert!(api.ticket_codec().is_signing());
    }
}
