// SPDX-License-Identifier: Apache-2.0

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 of `payload` under `secret`.
///
/// Returns `None` only when the MAC cannot be keyed, which HMAC never rejects
/// in practice but the `hmac` API surfaces as fallible.
#[must_use]
pub fn hmac_sha256_hex(secret: &[u8], payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature produced by [`hmac_sha256_hex`].
#[must_use]
pub fn verify_hmac_sha256_hex(secret: &[u8], payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
