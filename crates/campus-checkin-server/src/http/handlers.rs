// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::Ordering;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use campus_checkin_api::{
    openapi_v1_spec, ApiError, AttendanceDto, CheckinRequestDto, CheckinResponseDto,
    RegistrationDto, RegistrationListDto, TicketDto,
};
use campus_checkin_model::{EventId, Profile, UserId};
use serde_json::json;
use tracing::{info, warn};

use crate::http::request_tracing::RequestTrace;
use crate::http::response_contract::{
    api_error_response, checkin_api_error, registration_api_error,
};
use crate::services::bounded;
use crate::services::registration::RegistrationError;
use crate::AppState;

pub(crate) const CALLER_HEADER: &str = "x-user-id";

/// Resolves the caller from the proxy-supplied header. The role always comes
/// from the directory.
async fn caller(
    headers: &HeaderMap,
    state: &AppState,
    trace: &RequestTrace,
) -> Result<Profile, Response> {
    let raw = headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| api_error_response(ApiError::unauthenticated(), &trace.request_id))?;
    let user_id = UserId::parse(raw).map_err(|_| {
        api_error_response(ApiError::invalid_param(CALLER_HEADER, raw), &trace.request_id)
    })?;
    state
        .registrations
        .caller_profile(&user_id)
        .await
        .map_err(|e| registration_failure(&e, trace))
}

fn event_param(raw: &str, trace: &RequestTrace) -> Result<EventId, Response> {
    EventId::parse(raw)
        .map_err(|_| api_error_response(ApiError::invalid_param("event_id", raw), &trace.request_id))
}

fn registration_failure(err: &RegistrationError, trace: &RequestTrace) -> Response {
    warn!(error = %err, "registration request failed");
    api_error_response(registration_api_error(err), &trace.request_id)
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub(crate) async fn readyz_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
) -> Response {
    if !state.ready.load(Ordering::Relaxed) {
        return api_error_response(ApiError::not_ready("server not ready"), &trace.request_id);
    }
    match bounded(state.api.ledger_timeout, state.ledger.probe()).await {
        Ok(()) => Json(json!({"status": "ready", "backend": state.ledger.backend_tag()}))
            .into_response(),
        Err(fault) => {
            warn!(error = %fault, "readiness probe failed");
            api_error_response(
                ApiError::not_ready(format!("ledger probe failed: {fault}")),
                &trace.request_id,
            )
        }
    }
}

pub(crate) async fn openapi_handler() -> impl IntoResponse {
    Json(openapi_v1_spec())
}

pub(crate) async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "server": {
            "crate": crate::CRATE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "config_schema_version": crate::config::CONFIG_SCHEMA_VERSION,
        },
        "api_version": campus_checkin_api::API_VERSION,
        "backend": state.ledger.backend_tag(),
    }))
}

pub(crate) async fn register_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let event_id = match event_param(&event_id, &trace) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let profile = match caller(&headers, &state, &trace).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.registrations.register(&event_id, &profile.id).await {
        Ok(row) => (StatusCode::CREATED, Json(RegistrationDto::from(&row))).into_response(),
        Err(e) => registration_failure(&e, &trace),
    }
}

pub(crate) async fn my_registrations_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    headers: HeaderMap,
) -> Response {
    let profile = match caller(&headers, &state, &trace).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.registrations.list_for_student(&profile.id).await {
        Ok(rows) => Json(RegistrationListDto::new(&rows)).into_response(),
        Err(e) => registration_failure(&e, &trace),
    }
}

pub(crate) async fn ticket_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let event_id = match event_param(&event_id, &trace) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let profile = match caller(&headers, &state, &trace).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.registrations.ticket_for(&event_id, &profile.id).await {
        Ok(ticket) => Json(TicketDto {
            event_id: ticket.event_id.to_string(),
            student_id: ticket.student_id.to_string(),
            credential: ticket.credential,
            signed: ticket.signed,
        })
        .into_response(),
        Err(e) => registration_failure(&e, &trace),
    }
}

pub(crate) async fn attendance_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let event_id = match event_param(&event_id, &trace) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let profile = match caller(&headers, &state, &trace).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if !profile.role.can_scan() {
        return api_error_response(ApiError::forbidden(profile.role.as_str()), &trace.request_id);
    }
    match state.registrations.attendance(&event_id).await {
        Ok(counts) => Json(AttendanceDto::new(&event_id, counts)).into_response(),
        Err(e) => registration_failure(&e, &trace),
    }
}

/// Verdicts, rejections included, answer 200. Only the role gate and storage
/// failures are errors.
pub(crate) async fn checkin_handler(
    State(state): State<AppState>,
    Extension(trace): Extension<RequestTrace>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let operator = match caller(&headers, &state, &trace).await {
        Ok(p) => p,
        Err(resp) => {
            if resp.status() == StatusCode::NOT_FOUND {
                return api_error_response(ApiError::forbidden("unknown"), &trace.request_id);
            }
            return resp;
        }
    };
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return api_error_response(
                ApiError::payload_too_large(state.api.max_body_bytes),
                &trace.request_id,
            );
        }
        Err(rejection) => {
            return api_error_response(
                ApiError::invalid_request(rejection.body_text()),
                &trace.request_id,
            );
        }
    };
    let request: CheckinRequestDto = match serde_json::from_slice(&bytes) {
        Ok(req) => req,
        Err(e) => {
            return api_error_response(
                ApiError::invalid_request(format!("invalid check-in body: {e}")),
                &trace.request_id,
            );
        }
    };

    match state
        .verifier
        .verify(&request.credential, operator.role)
        .await
    {
        Ok(verdict) => {
            info!(operator = %operator.id, verdict = %verdict.kind(), "check-in answered");
            Json(CheckinResponseDto::from(&verdict)).into_response()
        }
        Err(e) => api_error_response(checkin_api_error(&e), &trace.request_id),
    }
}
