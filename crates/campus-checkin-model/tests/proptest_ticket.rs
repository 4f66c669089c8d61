// SPDX-License-Identifier: Apache-2.0

use campus_checkin_model::{EventId, TicketCodec, UserId, MAX_CREDENTIAL_BYTES};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn encoded_ticket_decodes_to_its_own_pair(
        event in "[A-Za-z0-9_-]{1,40}",
        student in "[A-Za-z0-9_-]{1,40}",
        name in proptest::option::of("[A-Za-z ]{0,30}"),
        secs in 0i64..4_000_000_000i64,
        signed in any::<bool>()
    ) {
        let event_id = EventId::parse(&event).expect("event id");
        let student_id = UserId::parse(&student).expect("student id");
        let issued = Utc.timestamp_opt(secs, 0).single().expect("timestamp");
        let codec = if signed {
            TicketCodec::signed(b"prop-secret".to_vec(), true)
        } else {
            TicketCodec::unsigned()
        };
        let text = codec
            .encode_at(&event_id, &student_id, name.as_deref(), issued)
            .expect("encode");
        let claims = codec.decode(&text).expect("decode");
        prop_assert_eq!(claims.event_id, event_id);
        prop_assert_eq!(claims.student_id, student_id);
    }

    #[test]
    fn arbitrary_text_never_panics_decode(text in ".{0,256}") {
        let _ = TicketCodec::unsigned().decode(&text);
    }

    #[test]
    fn oversized_input_is_always_malformed(pad in (MAX_CREDENTIAL_BYTES + 1)..(MAX_CREDENTIAL_BYTES + 64)) {
        let text = "x".repeat(pad);
        prop_assert!(TicketCodec::unsigned().decode(&text).is_err());
    }
}
