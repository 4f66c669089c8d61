// SPDX-License-Identifier: Apache-2.0

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use campus_checkin_api::error_mapping::map_error;
use campus_checkin_api::ApiError;
use serde_json::json;

use crate::services::registration::RegistrationError;
use crate::services::verifier::CheckinError;

/// Error body with the status the api contract assigns to its code.
pub(crate) fn api_error_response(err: ApiError, request_id: &str) -> Response {
    let err = err.with_request_id(request_id);
    let status = StatusCode::from_u16(map_error(&err).status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut resp = (status, Json(json!({"error": err}))).into_response();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        resp.headers_mut()
            .insert("retry-after", HeaderValue::from_static("3"));
    }
    resp
}

pub(crate) fn checkin_api_error(err: &CheckinError) -> ApiError {
    match err {
        CheckinError::Unauthorized { role } => ApiError::forbidden(role.as_str()),
        CheckinError::StorageUnavailable(msg) => ApiError::storage_unavailable(msg.clone(), true),
        CheckinError::StorageTimeout { timeout_ms } => ApiError::storage_timeout(*timeout_ms),
        CheckinError::StorageDisconnected(msg) => {
            ApiError::storage_unavailable(msg.clone(), false)
        }
    }
}

pub(crate) fn registration_api_error(err: &RegistrationError) -> ApiError {
    match err {
        RegistrationError::EventNotFound(id) => ApiError::event_not_found(id.as_str()),
        RegistrationError::EventClosed(id) => ApiError::event_closed(id.as_str()),
        RegistrationError::ProfileNotFound(id) => ApiError::profile_not_found(id.as_str()),
        RegistrationError::DuplicateRegistration {
            event_id,
            student_id,
        } => ApiError::duplicate_registration(event_id.as_str(), student_id.as_str()),
        RegistrationError::NotRegistered {
            event_id,
            student_id,
        } => ApiError::registration_not_found(event_id.as_str(), student_id.as_str()),
        RegistrationError::TicketEncoding(msg) => ApiError::internal(msg.clone()),
        RegistrationError::StorageUnavailable(msg) => {
            ApiError::storage_unavailable(msg.clone(), true)
        }
        RegistrationError::StorageTimeout { timeout_ms } => ApiError::storage_timeout(*timeout_ms),
        RegistrationError::StorageDisconnected(msg) => {
            ApiError::storage_unavailable(msg.clone(), false)
        }
    }
}
