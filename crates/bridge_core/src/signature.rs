//! Inbound webhook signature verification.
//!
//! The code host signs each webhook delivery with HMAC-SHA256 over the raw
//! request body and sends the lowercase hex digest in the
//! `X-Hub-Signature-256` header, prefixed with `sha256=`. Verification must
//! run against the raw bytes as received; re-serializing decoded JSON before
//! hashing produces false negatives.

use hmac::{Hmac, Mac};
use sha2::Sha256;

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Verify a webhook delivery against the shared secret.
///
/// An empty `secret` disables verification and every delivery is accepted.
/// Signature checking is opt-in, not opt-out: this is a deliberate
/// operational choice for deployments without a configured secret, not a
/// security recommendation.
///
/// Comparison is constant time (`Mac::verify_slice`). Every call emits an
/// audit log line with the outcome; the secret itself is never logged.
pub fn verify_webhook_signature(
    signature_header: Option<&str>,
    raw_body: &[u8],
    secret: &str,
) -> bool {
    if secret.is_empty() {
        tracing::debug!("webhook signature verification skipped: no secret configured");
        return true;
    }

    let Some(header) = signature_header else {
        tracing::warn!(header = SIGNATURE_HEADER, "webhook rejected: signature header missing");
        return false;
    };

    let Some(hex_part) = header.strip_prefix("sha256=") else {
        tracing::warn!("webhook rejected: signature header lacks sha256= prefix");
        return false;
    };

    let Ok(received) = hex::decode(hex_part) else {
        tracing::warn!("webhook rejected: signature is not valid hex");
        return false;
    };

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(raw_body);

    // `verify_slice` uses constant-time comparison internally.
    match mac.verify_slice(&received) {
        Ok(()) => {
            tracing::info!(body_len = raw_body.len(), "webhook signature verified");
            true
        }
        Err(_) => {
            tracing::warn!(body_len = raw_body.len(), "webhook rejected: signature mismatch");
            false
        }
    }
}
