//! Request and response bodies of the HTTP surface.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Response to a slash-command request.
///
/// The chat platform interprets `response_type`: `ephemeral` is visible to
/// the invoker only, `in_channel` to everyone. An entirely empty response
/// acknowledges without posting anything, used when the confirmation was
/// already posted through the chat API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlashResponse {
    /// `ephemeral` or `in_channel`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<&'static str>,

    /// Markdown message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SlashResponse {
    /// Message visible to the invoker only.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            response_type: Some("ephemeral"),
            text: Some(text.into()),
        }
    }

    /// Message visible to the whole channel.
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: Some("in_channel"),
            text: Some(text.into()),
        }
    }

    /// Acknowledge without posting anything.
    pub fn empty() -> Self {
        Self {
            response_type: None,
            text: None,
        }
    }
}

/// Decoded slash-command form payload.
///
/// Every field defaults to empty; the chat platform always sends them but
/// nothing here may panic on a hand-crafted request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlashForm {
    /// Static verification token.
    pub token: String,

    /// Raw command text after the trigger word.
    pub text: String,

    /// Invoking user id.
    pub user_id: String,

    /// Invoking username.
    pub user_name: String,

    /// Channel id the command was issued in.
    pub channel_id: String,

    /// Human-readable channel name.
    pub channel_name: String,

    /// Team domain of the workspace.
    pub team_domain: String,
}

impl SlashForm {
    /// Decode an `application/x-www-form-urlencoded` body.
    pub fn from_form_body(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let value = value.into_owned();
            match key.as_ref() {
                "token" => form.token = value,
                "text" => form.text = value,
                "user_id" => form.user_id = value,
                "user_name" => form.user_name = value,
                "channel_id" => form.channel_id = value,
                "channel_name" => form.channel_name = value,
                "team_domain" => form.team_domain = value,
                _ => {}
            }
        }
        form
    }
}

/// Service banner returned from `GET /`.
#[derive(Debug, Serialize)]
pub struct ServiceBanner {
    /// Service name.
    pub service: &'static str,

    /// Always `running` when the process answers at all.
    pub status: &'static str,

    /// Crate version.
    pub version: &'static str,

    /// Paths this service answers on.
    pub endpoints: Vec<&'static str>,
}

/// Which optional features are configured. Booleans only, never values.
#[derive(Debug, Serialize)]
pub struct FeatureFlags {
    /// Webhook signature verification is enabled.
    pub signature_verification: bool,

    /// Slash-command requests are checked against a static token.
    pub slash_token: bool,

    /// The chat REST API is configured, so replies can be threaded.
    pub chat_api: bool,

    /// The incoming-webhook fallback is configured.
    pub incoming_webhook: bool,
}

/// Liveness response from `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: &'static str,

    /// Current server time.
    pub timestamp: DateTime<Utc>,

    /// Crate version.
    pub version: &'static str,

    /// Configured optional features.
    pub features: FeatureFlags,
}

/// Acknowledgement of a code-host webhook request.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// `processed`, `ignored`, or `ok` for probes.
    pub status: &'static str,
}

/// Confirmation returned at the end of the OAuth2 callback.
#[derive(Debug, Serialize)]
pub struct AuthCallbackResponse {
    /// Always `connected`.
    pub status: &'static str,

    /// Human-readable confirmation.
    pub message: String,

    /// Code-host account the chat user is now linked to.
    pub forgejo_username: String,
}
