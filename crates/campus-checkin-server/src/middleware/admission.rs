// SPDX-License-Identifier: Apache-2.0

use crate::http::request_tracing::RequestTrace;
use crate::http::response_contract::api_error_response;
use crate::services::millis;
use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use campus_checkin_api::ApiError;
use std::sync::atomic::Ordering;
use tokio::time::timeout;
use tracing::warn;

/// Refuses work while draining and bounds every request by `request_timeout`.
pub(crate) async fn admission_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestTrace>()
        .map(|t| t.request_id.clone())
        .unwrap_or_else(|| "req-unknown".to_string());
    let path = request.uri().path();
    if !state.accepting_requests.load(Ordering::Relaxed) && path != "/healthz" {
        return api_error_response(ApiError::not_ready("server is shutting down"), &request_id);
    }
    match timeout(state.api.request_timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("request timed out");
            api_error_response(
                ApiError::request_timeout(millis(state.api.request_timeout)),
                &request_id,
            )
        }
    }
}
