//! Startup configuration from environment variables.
//!
//! Configuration is read once at startup into [`BridgeConfig`]. The OAuth2
//! application registration (`FORGEJO_URL`, `FORGEJO_CLIENT_ID`,
//! `FORGEJO_CLIENT_SECRET`) is required and missing values fail startup.
//! Everything else is optional and disables the corresponding feature when
//! absent:
//!
//! - `WEBHOOK_SECRET`: HMAC secret for inbound code-host webhooks; unset
//!   means signature verification is skipped.
//! - `MATTERMOST_TOKEN`: static token expected on slash-command requests.
//! - `MATTERMOST_WEBHOOK_URL`: incoming-webhook fallback for notifications.
//! - `MATTERMOST_API_URL` + `MATTERMOST_API_TOKEN`: chat REST API for
//!   threaded replies; both must be set for the chat API to be used.
//! - `BASE_URL`: externally reachable URL of this service, used to build
//!   the OAuth2 redirect and connect links (default derived from the bind
//!   address).
//! - `HOST` / `PORT`: bind address (default `0.0.0.0:8080`).
//! - `DATABASE_PATH`: SQLite file (default `bridge.db`).

use std::env;
use std::path::PathBuf;

use anyhow::Context;

use crate::DEFAULT_PORT;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Resolved startup configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL of the Forgejo instance.
    pub forgejo_url: String,

    /// OAuth2 client id of the registered application.
    pub client_id: String,

    /// OAuth2 client secret of the registered application.
    pub client_secret: String,

    /// Externally reachable base URL of this bridge.
    pub base_url: String,

    /// HMAC secret for inbound webhook signatures, when verification is
    /// enabled.
    pub webhook_secret: Option<String>,

    /// Static token expected on slash-command requests, when configured.
    pub slash_token: Option<String>,

    /// Mattermost incoming-webhook URL for fallback notifications.
    pub incoming_webhook_url: Option<String>,

    /// Mattermost REST API base URL.
    pub chat_api_url: Option<String>,

    /// Mattermost bot token for the REST API.
    pub chat_api_token: Option<String>,

    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Path of the SQLite database file.
    pub database_path: PathBuf,
}

impl BridgeConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`. Split out so tests can supply
    /// an environment without mutating the process.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Empty values behave as unset; a blank line in an env file must
        // not enable a feature with an empty secret.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let forgejo_url = get("FORGEJO_URL")
            .context("FORGEJO_URL is required")?
            .trim_end_matches('/')
            .to_string();
        let client_id = get("FORGEJO_CLIENT_ID").context("FORGEJO_CLIENT_ID is required")?;
        let client_secret =
            get("FORGEJO_CLIENT_SECRET").context("FORGEJO_CLIENT_SECRET is required")?;

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {value}"))?,
            None => DEFAULT_PORT,
        };

        let base_url = get("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            forgejo_url,
            client_id,
            client_secret,
            base_url,
            webhook_secret: get("WEBHOOK_SECRET"),
            slash_token: get("MATTERMOST_TOKEN"),
            incoming_webhook_url: get("MATTERMOST_WEBHOOK_URL"),
            chat_api_url: get("MATTERMOST_API_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            chat_api_token: get("MATTERMOST_API_TOKEN"),
            host,
            port,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("bridge.db")),
        })
    }

    /// Chat REST API endpoint and token, when both are configured.
    pub fn chat_api(&self) -> Option<(&str, &str)> {
        match (&self.chat_api_url, &self.chat_api_token) {
            (Some(url), Some(token)) => Some((url.as_str(), token.as_str())),
            _ => None,
        }
    }

    /// OAuth2 redirect URI registered with the code host.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }

    /// Link a user follows to start the authorization flow.
    pub fn connect_url(&self, user_id: &str, username: &str) -> String {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("user_id", user_id)
            .append_pair("username", username)
            .finish();
        format!("{}/auth/connect?{}", self.base_url, query)
    }
}
