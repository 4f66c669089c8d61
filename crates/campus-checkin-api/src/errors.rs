// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidRequest,
    Unauthenticated,
    Forbidden,
    EventNotFound,
    ProfileNotFound,
    RegistrationNotFound,
    DuplicateRegistration,
    EventClosed,
    PayloadTooLarge,
    StorageUnavailable,
    StorageTimeout,
    RequestTimeout,
    NotReady,
    Internal,
}

pub const API_ERROR_CODES: &[&str] = &[
    "InvalidRequest",
    "Unauthenticated",
    "Forbidden",
    "EventNotFound",
    "ProfileNotFound",
    "RegistrationNotFound",
    "DuplicateRegistration",
    "EventClosed",
    "PayloadTooLarge",
    "StorageUnavailable",
    "StorageTimeout",
    "RequestTimeout",
    "NotReady",
    "Internal",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, message, json!({}), "req-unknown")
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidRequest,
            format!("invalid parameter: {name}"),
            json!({"field_errors":[{"parameter": name, "reason": "invalid", "value": value}]}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(
            ApiErrorCode::Unauthenticated,
            "missing caller identity",
            json!({"header": "x-user-id"}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn forbidden(role: &str) -> Self {
        Self::new(
            ApiErrorCode::Forbidden,
            "role is not allowed to operate the scanner",
            json!({"role": role}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn event_not_found(event_id: &str) -> Self {
        Self::new(
            ApiErrorCode::EventNotFound,
            format!("event not found: {event_id}"),
            json!({"event_id": event_id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn profile_not_found(user_id: &str) -> Self {
        Self::new(
            ApiErrorCode::ProfileNotFound,
            format!("profile not found: {user_id}"),
            json!({"user_id": user_id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn registration_not_found(event_id: &str, student_id: &str) -> Self {
        Self::new(
            ApiErrorCode::RegistrationNotFound,
            "registration not found",
            json!({"event_id": event_id, "student_id": student_id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn duplicate_registration(event_id: &str, student_id: &str) -> Self {
        Self::new(
            ApiErrorCode::DuplicateRegistration,
            "already registered for this event",
            json!({"event_id": event_id, "student_id": student_id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn event_closed(event_id: &str) -> Self {
        Self::new(
            ApiErrorCode::EventClosed,
            format!("event is closed for registration: {event_id}"),
            json!({"event_id": event_id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn storage_unavailable(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(
            ApiErrorCode::StorageUnavailable,
            message,
            json!({"retryable": retryable}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn storage_timeout(timeout_ms: u64) -> Self {
        Self::new(
            ApiErrorCode::StorageTimeout,
            "ledger did not answer in time",
            json!({"retryable": true, "timeout_ms": timeout_ms}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn request_timeout(timeout_ms: u64) -> Self {
        Self::new(
            ApiErrorCode::RequestTimeout,
            "request timed out",
            json!({"timeout_ms": timeout_ms}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NotReady, message, json!({}), "req-unknown")
    }

    #[must_use]
    pub fn payload_too_large(limit_bytes: usize) -> Self {
        Self::new(
            ApiErrorCode::PayloadTooLarge,
            "request body too large",
            json!({"limit_bytes": limit_bytes}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Internal, message, json!({}), "req-unknown")
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
    assert_traits::<ApiError>();
};
