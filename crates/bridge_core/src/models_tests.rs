//! Tests for domain record helpers.

use chrono::{Duration, Utc};

use super::*;

fn credential_with_expiry(expires_at: Option<chrono::DateTime<Utc>>) -> UserCredential {
    let now = Utc::now();
    UserCredential {
        chat_user_id: "u1".to_string(),
        chat_username: "alice".to_string(),
        access_token: "token".to_string(),
        refresh_token: None,
        remote_username: "alice-forge".to_string(),
        expires_at,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_credential_with_future_expiry_is_valid() {
    let cred = credential_with_expiry(Some(Utc::now() + Duration::hours(1)));
    assert!(!cred.is_expired(Utc::now()));
}

#[test]
fn test_credential_with_past_expiry_is_expired() {
    let cred = credential_with_expiry(Some(Utc::now() - Duration::seconds(1)));
    assert!(cred.is_expired(Utc::now()));
}

#[test]
fn test_credential_expiry_boundary_is_expired() {
    let instant = Utc::now();
    let cred = credential_with_expiry(Some(instant));
    assert!(cred.is_expired(instant));
}

#[test]
fn test_credential_without_expiry_never_expires() {
    let cred = credential_with_expiry(None);
    assert!(!cred.is_expired(Utc::now() + Duration::days(3650)));
}

#[test]
fn test_token_grant_lifetime_defaults_to_one_hour() {
    let grant: TokenGrant = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
    assert_eq!(grant.access_token, "abc");
    assert_eq!(grant.refresh_token, None);
    assert_eq!(grant.lifetime_seconds(), 3600);
}

#[test]
fn test_token_grant_deserializes_oauth_response() {
    let grant: TokenGrant = serde_json::from_str(
        r#"{"access_token": "abc", "refresh_token": "def", "expires_in": 7200, "token_type": "bearer"}"#,
    )
    .unwrap();
    assert_eq!(grant.refresh_token.as_deref(), Some("def"));
    assert_eq!(grant.lifetime_seconds(), 7200);
}
