// SPDX-License-Identifier: Apache-2.0

//! Ticket credential encoding.
//!
//! A credential is the compact JSON text rendered into the QR code shown at
//! the door:
//!
//! ```text
//! {"eventId":"E1","issuedAt":"2026-10-18T09:00:00Z","studentId":"S1","studentName":"Asha"}
//! ```
//!
//! Keys are sorted and whitespace-free so every encoder instance produces the
//! same layout. Only `eventId` and `studentId` identify the holder;
//! `studentName` is display text and `sig` is an optional HMAC over the three
//! authoritative fields.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use campus_checkin_core::canonical::{stable_json_bytes, stable_json_string};
use campus_checkin_core::signing::{hmac_sha256_hex, verify_hmac_sha256_hex};

use crate::ids::{EventId, StudentId};
use crate::registration::Registration;

pub const MAX_CREDENTIAL_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TicketCredential {
    pub event_id: EventId,
    pub student_id: StudentId,
    #[serde(alias = "timestamp")]
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

/// The authoritative part of a decoded credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketClaims {
    pub event_id: EventId,
    pub student_id: StudentId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedFields<'a> {
    event_id: &'a EventId,
    student_id: &'a StudentId,
    issued_at: &'a DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCredential(pub String);

impl Display for MalformedCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed credential: {}", self.0)
    }
}

impl std::error::Error for MalformedCredential {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketEncodeError(pub String);

impl Display for TicketEncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ticket encode failed: {}", self.0)
    }
}

impl std::error::Error for TicketEncodeError {}

/// Encodes and strictly decodes ticket credentials.
///
/// With a signing key every encoded ticket carries `sig`, and any `sig`
/// presented on decode must verify. `require_signature` additionally rejects
/// unsigned tickets.
#[derive(Clone, Default)]
pub struct TicketCodec {
    signing_key: Option<Vec<u8>>,
    require_signature: bool,
}

impl std::fmt::Debug for TicketCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketCodec")
            .field("signed", &self.signing_key.is_some())
            .field("require_signature", &self.require_signature)
            .finish()
    }
}

impl TicketCodec {
    #[must_use]
    pub fn unsigned() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed(secret: impl Into<Vec<u8>>, require_signature: bool) -> Self {
        Self {
            signing_key: Some(secret.into()),
            require_signature,
        }
    }

    #[must_use]
    pub fn is_signing(&self) -> bool {
        self.signing_key.is_some()
    }

    pub fn encode(
        &self,
        registration: &Registration,
        display_name: Option<&str>,
    ) -> Result<String, TicketEncodeError> {
        self.encode_at(
            &registration.event_id,
            &registration.student_id,
            display_name,
            Utc::now(),
        )
    }

    pub fn encode_at(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
        display_name: Option<&str>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TicketEncodeError> {
        let issued_at = issued_at.trunc_subsecs(0);
        let sig = match &self.signing_key {
            Some(key) => Some(sign(key, event_id, student_id, &issued_at)?),
            None => None,
        };
        let credential = TicketCredential {
            event_id: event_id.clone(),
            student_id: student_id.clone(),
            issued_at,
            student_name: display_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToString::to_string),
            sig,
        };
        stable_json_string(&credential).map_err(|e| TicketEncodeError(e.to_string()))
    }

    pub fn decode(&self, text: &str) -> Result<TicketClaims, MalformedCredential> {
        if text.len() > MAX_CREDENTIAL_BYTES {
            return Err(MalformedCredential(format!(
                "credential exceeds {MAX_CREDENTIAL_BYTES} bytes"
            )));
        }
        let credential: TicketCredential = serde_json::from_str(text.trim())
            .map_err(|e| MalformedCredential(e.to_string()))?;

        if let Some(key) = &self.signing_key {
            match credential.sig.as_deref() {
                Some(sig) => {
                    let payload = signed_payload(
                        &credential.event_id,
                        &credential.student_id,
                        &credential.issued_at,
                    )
                    .map_err(|e| MalformedCredential(e.0))?;
                    if !verify_hmac_sha256_hex(key, &payload, sig) {
                        return Err(MalformedCredential("signature mismatch".to_string()));
                    }
                }
                None if self.require_signature => {
                    return Err(MalformedCredential("missing signature".to_string()));
                }
                None => {}
            }
        }

        Ok(TicketClaims {
            event_id: credential.event_id,
            student_id: credential.student_id,
        })
    }
}

fn signed_payload(
    event_id: &EventId,
    student_id: &StudentId,
    issued_at: &DateTime<Utc>,
) -> Result<Vec<u8>, TicketEncodeError> {
    stable_json_bytes(&SignedFields {
        event_id,
        student_id,
        issued_at,
    })
    .map_err(|e| TicketEncodeError(e.to_string()))
}

fn sign(
    key: &[u8],
    event_id: &EventId,
    student_id: &StudentId,
    issued_at: &DateTime<Utc>,
) -> Result<String, TicketEncodeError> {
    let payload = signed_payload(event_id, student_id, issued_at)?;
    hmac_sha256_hex(key, &payload).ok_or_else(|| TicketEncodeError("hmac key rejected".to_string()))
}
