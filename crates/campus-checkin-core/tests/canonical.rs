// SPDX-License-Identifier: Apache-2.0

use campus_checkin_core::signing::{hmac_sha256_hex, verify_hmac_sha256_hex};
use campus_checkin_core::{canonical, sha256_hex, ExitCode, MachineError};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn stable_json_bytes_are_key_order_deterministic() {
    let a = json!({"studentId": "s1", "eventId": "e1", "issuedAt": "2026-01-01T00:00:00Z"});
    let b = json!({"issuedAt": "2026-01-01T00:00:00Z", "eventId": "e1", "studentId": "s1"});
    let ba = canonical::stable_json_bytes(&a).expect("stable json a");
    let bb = canonical::stable_json_bytes(&b).expect("stable json b");
    assert_eq!(ba, bb);
}

#[test]
fn sha256_is_repeatable_for_same_bytes() {
    let bytes = b"campus-checkin-determinism";
    assert_eq!(sha256_hex(bytes), sha256_hex(bytes));
    assert_ne!(sha256_hex(b"e1\0s1"), sha256_hex(b"e1\0s2"));
}

#[test]
fn machine_error_serializes_with_details() {
    let err = MachineError::new("not_registered", "registration not found")
        .with_detail("event_id", "E1");
    let text = serde_json::to_string(&err).expect("encode machine error");
    assert!(text.contains("\"event_id\":\"E1\""));
    assert_eq!(err.to_string(), "not_registered: registration not found");
    assert_eq!(ExitCode::Rejected as u8, 5);
    assert_eq!(ExitCode::DependencyFailure.as_str(), "dependency_failure");
}

proptest! {
    #[test]
    fn signatures_verify_only_for_the_signed_payload(
        secret in proptest::collection::vec(any::<u8>(), 1..64),
        payload in proptest::collection::vec(any::<u8>(), 0..256),
        flip in any::<u8>(),
    ) {
        let sig = hmac_sha256_hex(&secret, &payload).expect("sign");
        prop_assert!(verify_hmac_sha256_hex(&secret, &payload, &sig));
        let mut tampered = payload.clone();
        tampered.push(flip);
        prop_assert!(!verify_hmac_sha256_hex(&secret, &tampered, &sig));
    }
}
