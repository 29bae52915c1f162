//! Tests for Mattermost client errors.

use super::*;

#[test]
fn test_status_error_message_names_operation_and_code() {
    let error = Error::Status(401, "posting message");
    assert_eq!(
        error.to_string(),
        "mattermost returned status 401 while posting message"
    );
}
