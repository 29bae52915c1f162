//! Tests for webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::*;

/// Compute the header value the code host would send for `body` and `secret`.
fn sign(body: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[test]
fn test_valid_signature_is_accepted() {
    let body = br#"{"action":"opened"}"#;
    let header = sign(body, "s3cret");
    assert!(verify_webhook_signature(Some(&header), body, "s3cret"));
}

#[test]
fn test_signature_over_different_body_is_rejected() {
    let header = sign(br#"{"action":"opened"}"#, "s3cret");
    assert!(!verify_webhook_signature(
        Some(&header),
        br#"{"action":"closed"}"#,
        "s3cret"
    ));
}

#[test]
fn test_signature_with_wrong_secret_is_rejected() {
    let body = br#"{"action":"opened"}"#;
    let header = sign(body, "other-secret");
    assert!(!verify_webhook_signature(Some(&header), body, "s3cret"));
}

#[test]
fn test_empty_secret_accepts_anything() {
    assert!(verify_webhook_signature(None, b"body", ""));
    assert!(verify_webhook_signature(Some("sha256=junk"), b"body", ""));
    assert!(verify_webhook_signature(Some("garbage"), b"body", ""));
}

#[test]
fn test_missing_header_is_rejected() {
    assert!(!verify_webhook_signature(None, b"body", "s3cret"));
}

#[test]
fn test_missing_prefix_is_rejected() {
    let header = sign(b"body", "s3cret");
    let without_prefix = header.strip_prefix("sha256=").unwrap();
    assert!(!verify_webhook_signature(
        Some(without_prefix),
        b"body",
        "s3cret"
    ));
}

#[test]
fn test_non_hex_signature_is_rejected() {
    assert!(!verify_webhook_signature(
        Some("sha256=not-hex-at-all"),
        b"body",
        "s3cret"
    ));
}
