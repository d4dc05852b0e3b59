//! Webhook signature verification.
//!
//! The payment processor signs the raw request body with HMAC-SHA256
//! and sends the hex digest in `X-Webhook-Signature`. Verification runs
//! against the raw bytes, before any JSON parsing, and uses the hmac
//! crate's constant-time comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the hex HMAC-SHA256 signature of a payload.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        // HMAC accepts keys of any length; new_from_slice cannot fail.
        return String::new();
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a hex HMAC-SHA256 signature against a payload.
#[must_use]
pub fn verify(secret: &str, body: &[u8], provided_hex: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    mac.verify_slice(&provided).is_ok()
}
