// SPDX-License-Identifier: Apache-2.0

use campus_checkin_model::{
    AttendanceCounts, EventId, EventRecord, EventStatus, Profile, Registration,
    RegistrationStatus, Role, ScanVerdict, TicketCredential, UserId,
};
use chrono::{TimeZone, Utc};

#[test]
fn registration_rejects_unknown_fields() {
    let raw = r#"{
      "id":"reg_0011",
      "eventId":"E1",
      "studentId":"S1",
      "status":"registered",
      "registeredAt":"2026-10-18T09:00:00Z",
      "paid":true
    }"#;
    assert!(serde_json::from_str::<Registration>(raw).is_err());
}

#[test]
fn registration_rejects_unknown_status() {
    let raw = r#"{"id":"reg_0011","eventId":"E1","studentId":"S1","status":"cancelled","registeredAt":"2026-10-18T09:00:00Z"}"#;
    assert!(serde_json::from_str::<Registration>(raw).is_err());
}

#[test]
fn registration_wire_shape_is_camel_case() {
    let at = Utc
        .with_ymd_and_hms(2026, 10, 18, 9, 0, 0)
        .single()
        .expect("time");
    let reg = Registration::new(
        EventId::parse("E1").expect("event"),
        UserId::parse("S1").expect("student"),
        at,
    );
    let value = serde_json::to_value(&reg).expect("encode registration");
    assert_eq!(value["eventId"], "E1");
    assert_eq!(value["studentId"], "S1");
    assert_eq!(value["status"], RegistrationStatus::Registered.as_str());
    assert!(value.get("attendedAt").is_none());
    let back: Registration = serde_json::from_value(value).expect("decode registration");
    assert_eq!(back, reg);
}

#[test]
fn directory_records_use_snake_case_enums() {
    let profile = Profile::new(
        UserId::parse("A1").expect("user"),
        "Dev Rao",
        Some("STAFF-7"),
        Role::ClubAdmin,
    )
    .expect("profile");
    let value = serde_json::to_value(&profile).expect("encode profile");
    assert_eq!(value["role"], "club_admin");
    assert_eq!(value["collegeCode"], "STAFF-7");

    let event = EventRecord::new(
        EventId::parse("E1").expect("event"),
        "Spring Hackathon",
        "Main Hall",
        Utc::now(),
        EventStatus::Open,
    )
    .expect("event");
    let value = serde_json::to_value(&event).expect("encode event");
    assert_eq!(value["status"], "open");
    assert!(serde_json::from_str::<Role>(r#""admin""#).is_err());
}

#[test]
fn ticket_credential_rejects_unknown_fields() {
    let raw = r#"{"eventId":"E1","studentId":"S1","issuedAt":"2026-10-18T09:00:00Z","seat":"A4"}"#;
    assert!(serde_json::from_str::<TicketCredential>(raw).is_err());
}

#[test]
fn verdict_and_counts_serialize_for_clients() {
    let verdict = ScanVerdict::Malformed {
        reason: "expected value at line 1 column 1".to_string(),
    };
    let value = serde_json::to_value(&verdict).expect("encode verdict");
    assert_eq!(value["verdict"], "MALFORMED");

    let counts = AttendanceCounts {
        registered: 3,
        attended: 2,
    };
    let value = serde_json::to_value(counts).expect("encode counts");
    assert_eq!(value, serde_json::json!({"registered": 3, "attended": 2}));
}
