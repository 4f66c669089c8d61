// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use campus_checkin_store::{CampusDirectory, RegistrationLedger};

use crate::config::ApiConfig;
use crate::http;
use crate::middleware::admission::admission_middleware;
use crate::middleware::request_tracing::request_tracing_middleware;
use crate::services::registration::RegistrationService;
use crate::services::verifier::CheckinVerifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<CheckinVerifier>,
    pub registrations: Arc<RegistrationService>,
    pub ledger: Arc<dyn RegistrationLedger>,
    pub api: ApiConfig,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    /// State over a backend that serves both the ledger and the directory.
    #[must_use]
    pub fn new<B>(backend: Arc<B>) -> Self
    where
        B: RegistrationLedger + CampusDirectory,
    {
        Self::with_config(backend, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config<B>(backend: Arc<B>, api: ApiConfig) -> Self
    where
        B: RegistrationLedger + CampusDirectory,
    {
        let ledger: Arc<dyn RegistrationLedger> = backend.clone();
        let directory: Arc<dyn CampusDirectory> = backend;
        Self::with_backends(ledger, directory, api)
    }

    #[must_use]
    pub fn with_backends(
        ledger: Arc<dyn RegistrationLedger>,
        directory: Arc<dyn CampusDirectory>,
        api: ApiConfig,
    ) -> Self {
        let codec = api.ticket_codec();
        let verifier = CheckinVerifier::new(ledger.clone(), directory.clone(), codec.clone())
            .with_ledger_timeout(api.ledger_timeout)
            .with_directory_timeout(api.directory_timeout());
        let registrations =
            RegistrationService::new(ledger.clone(), directory, codec, api.ledger_timeout);
        Self {
            verifier: Arc::new(verifier),
            registrations: Arc::new(registrations),
            ledger,
            api,
            ready: Arc::new(AtomicBool::new(true)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/v1/openapi.json", get(http::handlers::openapi_handler))
        .route("/v1/version", get(http::handlers::version_handler))
        .route(
            "/v1/events/:event_id/registrations",
            post(http::handlers::register_handler),
        )
        .route(
            "/v1/events/:event_id/ticket",
            get(http::handlers::ticket_handler),
        )
        .route(
            "/v1/events/:event_id/attendance",
            get(http::handlers::attendance_handler),
        )
        .route(
            "/v1/me/registrations",
            get(http::handlers::my_registrations_handler),
        )
        .route("/v1/checkins", post(http::handlers::checkin_handler))
        .layer(from_fn_with_state(state.clone(), admission_middleware))
        .layer(from_fn_with_state(state.clone(), request_tracing_middleware))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_checkin_store::InMemoryLedger;
    use std::sync::atomic::Ordering;

    #[test]
    fn state_shares_flags_across_clones() {
        let state = AppState::new(Arc::new(InMemoryLedger::default()));
        let clone = state.clone();
        clone.accepting_requests.store(false, Ordering::Relaxed);
        assert!(!state.accepting_requests.load(Ordering::Relaxed));
        assert_eq!(state.ledger.backend_tag(), "memory");
    }

    #[test]
    fn codec_follows_config() {
        let api = ApiConfig {
            ticket_secret: Some("door-key".to_string()),
            require_signed_tickets: true,
            ..ApiConfig::default()
        };
        let state = AppState::with_config(Arc::new(InMemoryLedger::default()), api);
        assert!(state.verifier.codec().is_signing());
    }
}
