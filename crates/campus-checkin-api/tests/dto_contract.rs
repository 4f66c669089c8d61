// SPDX-License-Identifier: Apache-2.0

use campus_checkin_api::{AttendanceDto, CheckinRequestDto, CheckinResponseDto, RegistrationListDto};
use campus_checkin_model::{
    AttendanceCounts, AttendeeSummary, EventId, Registration, ScanVerdict, UserId,
};
use chrono::Utc;

fn attendee() -> AttendeeSummary {
    AttendeeSummary {
        student_id: UserId::parse("S1").expect("student"),
        full_name: Some("Asha Verma".to_string()),
        college_code: Some("CS-2041".to_string()),
        event_id: EventId::parse("E1").expect("event"),
        event_title: Some("Spring Hackathon".to_string()),
    }
}

#[test]
fn checkin_request_rejects_unknown_fields() {
    assert!(serde_json::from_str::<CheckinRequestDto>(r#"{"credential":"x"}"#).is_ok());
    assert!(serde_json::from_str::<CheckinRequestDto>(r#"{"credential":"x","role":"college_admin"}"#).is_err());
    assert!(serde_json::from_str::<CheckinRequestDto>(r#"{}"#).is_err());
}

#[test]
fn checkin_response_carries_display_model() {
    let accepted = CheckinResponseDto::from(&ScanVerdict::Accepted { attendee: attendee() });
    assert_eq!(accepted.verdict, "ACCEPTED");
    assert_eq!(accepted.headline, "ACCESS GRANTED");
    assert_eq!(accepted.message, "Verified: Asha Verma");
    assert_eq!(accepted.student_id.as_deref(), Some("S1"));
    assert_eq!(
        accepted.attendee.as_ref().and_then(|a| a.event_title.as_deref()),
        Some("Spring Hackathon")
    );

    let dup = CheckinResponseDto::from(&ScanVerdict::AlreadyUsed { attendee: attendee() });
    assert_eq!(dup.verdict, "ALREADY_USED");
    assert_eq!(dup.message, "ALREADY SCANNED: Asha Verma");

    let malformed = CheckinResponseDto::from(&ScanVerdict::Malformed {
        reason: "expected value".to_string(),
    });
    let value = serde_json::to_value(&malformed).expect("encode");
    assert_eq!(value["verdict"], "MALFORMED");
    assert_eq!(value["message"], "Invalid QR code format");
    assert!(value.get("attendee").is_none());
    assert!(value.get("student_id").is_none());
}

#[test]
fn registration_list_and_attendance_shapes() {
    let reg = Registration::new(
        EventId::parse("E1").expect("event"),
        UserId::parse("S1").expect("student"),
        Utc::now(),
    );
    let list = RegistrationListDto::new(std::slice::from_ref(&reg));
    let value = serde_json::to_value(&list).expect("encode");
    assert_eq!(value["api_version"], "v1");
    assert_eq!(value["registrations"][0]["status"], "registered");
    assert_eq!(value["registrations"][0]["id"], reg.id.as_str());

    let counts = AttendanceCounts {
        registered: 4,
        attended: 6,
    };
    let dto = AttendanceDto::new(&EventId::parse("E1").expect("event"), counts);
    assert_eq!(dto.total, 10);
}
