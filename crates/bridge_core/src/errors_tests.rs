//! Tests for error display formatting.

use super::*;

#[test]
fn test_issue_key_error_messages() {
    assert_eq!(
        IssueKeyError::EmptyOwner.to_string(),
        "issue key owner must not be empty"
    );
    assert_eq!(
        IssueKeyError::Malformed("nonsense".to_string()).to_string(),
        "malformed issue key: nonsense"
    );
}

#[test]
fn test_command_error_mentions_usage_shape() {
    let message = CommandError::MissingParameters.to_string();
    assert!(message.contains("<owner> <repo> <title>"));
}

#[test]
fn test_dispatch_error_carries_context() {
    let err = DispatchError::Delivery("connection refused".to_string());
    assert!(err.to_string().contains("connection refused"));
}
