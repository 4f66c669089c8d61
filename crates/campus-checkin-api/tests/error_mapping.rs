// SPDX-License-Identifier: Apache-2.0

use campus_checkin_api::error_mapping::{map_error, API_ERROR_SCHEMA_REF};
use campus_checkin_api::{ApiError, ApiErrorCode, API_ERROR_CODES};
use serde_json::json;

#[test]
fn api_error_mapping_is_centralized_and_stable() {
    let cases = [
        (ApiError::invalid_request("bad body"), 400),
        (ApiError::unauthenticated(), 401),
        (ApiError::forbidden("student"), 403),
        (ApiError::event_not_found("E1"), 404),
        (ApiError::registration_not_found("E1", "S1"), 404),
        (ApiError::duplicate_registration("E1", "S1"), 409),
        (ApiError::event_closed("E1"), 422),
        (ApiError::storage_unavailable("ledger down", true), 503),
        (ApiError::storage_timeout(2000), 504),
        (ApiError::request_timeout(5000), 504),
        (ApiError::payload_too_large(4096), 413),
        (ApiError::not_ready("draining"), 503),
        (ApiError::internal("boom"), 500),
    ];
    for (err, status) in cases {
        let mapped = map_error(&err);
        assert_eq!(mapped.status_code, status, "status for {:?}", err.code);
        assert_eq!(mapped.schema_ref, API_ERROR_SCHEMA_REF);
    }
}

#[test]
fn api_error_wire_shape_is_strict() {
    let err = ApiError::storage_timeout(250).with_request_id("req-0000000000000001");
    let value = serde_json::to_value(&err).expect("encode error");
    assert_eq!(value["code"], "StorageTimeout");
    assert_eq!(value["details"], json!({"retryable": true, "timeout_ms": 250}));
    assert_eq!(value["request_id"], "req-0000000000000001");

    let raw = r#"{"code":"Forbidden","message":"m","details":{},"request_id":"r","extra":1}"#;
    assert!(serde_json::from_str::<ApiError>(raw).is_err());
}

#[test]
fn published_error_code_list_matches_enum_serialization() {
    for code in [
        ApiErrorCode::InvalidRequest,
        ApiErrorCode::Unauthenticated,
        ApiErrorCode::Forbidden,
        ApiErrorCode::EventNotFound,
        ApiErrorCode::ProfileNotFound,
        ApiErrorCode::RegistrationNotFound,
        ApiErrorCode::DuplicateRegistration,
        ApiErrorCode::EventClosed,
        ApiErrorCode::PayloadTooLarge,
        ApiErrorCode::StorageUnavailable,
        ApiErrorCode::StorageTimeout,
        ApiErrorCode::RequestTimeout,
        ApiErrorCode::NotReady,
        ApiErrorCode::Internal,
    ] {
        let name = serde_json::to_value(code).expect("encode code");
        let name = name.as_str().expect("code string");
        assert!(API_ERROR_CODES.contains(&name), "unpublished code {name}");
    }
    assert_eq!(API_ERROR_CODES.len(), 14);
}
