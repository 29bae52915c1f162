//! Persistent domain records shared between the relay logic and the stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::issue_key::IssueKey;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Stored association between an issue and the chat thread discussing it.
///
/// Created when a chat-originated command successfully creates an issue, and
/// read by every inbound code-host event to decide routing. Rows are never
/// deleted in normal operation; a later command for the same issue key
/// overwrites the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadCorrelation {
    /// Issue this thread belongs to.
    pub issue_key: IssueKey,

    /// Chat channel the originating command was issued in.
    pub channel_id: String,

    /// Chat username of the user who created the issue.
    pub username: String,

    /// Human-readable channel name, kept for issue body rendering.
    pub channel_name: String,

    /// Chat team domain.
    pub team_domain: String,

    /// When this correlation row was last written.
    pub created_at: DateTime<Utc>,

    /// Web URL of the issue on the code host.
    pub issue_url: String,

    /// Id of the root chat message of the thread.
    ///
    /// Populated only when the chat-API post of the confirmation message
    /// succeeded. Absence means later events for this issue fall back to
    /// un-threaded delivery.
    pub root_message_id: Option<String>,
}

/// A correlation as submitted for storage.
///
/// `created_at` is stamped by the store on every write, so callers never
/// provide it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThreadCorrelation {
    /// Issue this thread belongs to.
    pub issue_key: IssueKey,

    /// Chat channel the originating command was issued in.
    pub channel_id: String,

    /// Chat username of the user who created the issue.
    pub username: String,

    /// Human-readable channel name.
    pub channel_name: String,

    /// Chat team domain.
    pub team_domain: String,

    /// Web URL of the issue on the code host.
    pub issue_url: String,

    /// Root chat message id, when the confirmation post succeeded.
    pub root_message_id: Option<String>,
}

/// A chat user's code-host credential.
///
/// Created or overwritten by the authorization flow, removed by the `reset`
/// command or by expiry. The store never returns an expired credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredential {
    /// Chat platform user id (primary key).
    pub chat_user_id: String,

    /// Chat platform username at authorization time.
    pub chat_username: String,

    /// Code-host access token.
    pub access_token: String,

    /// Code-host refresh token, when the provider issued one.
    pub refresh_token: Option<String>,

    /// Code-host account name this credential belongs to.
    pub remote_username: String,

    /// Instant after which the credential is invalid.
    pub expires_at: Option<DateTime<Utc>>,

    /// When the row was first created.
    pub created_at: DateTime<Utc>,

    /// When the row was last overwritten.
    pub updated_at: DateTime<Utc>,
}

impl UserCredential {
    /// Whether the credential is expired at `now`.
    ///
    /// A credential without an expiry never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// Token material returned by the code host's OAuth2 token endpoint.
///
/// Field names follow the OAuth2 wire format so the exchange response can be
/// deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Bearer token for code-host API calls.
    pub access_token: String,

    /// Refresh token, when issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Lifetime of the access token in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Token lifetime in seconds, defaulting to one hour when the provider
    /// omitted `expires_in`.
    pub fn lifetime_seconds(&self) -> i64 {
        self.expires_in.unwrap_or(3600)
    }
}
