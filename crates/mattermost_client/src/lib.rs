//! Mattermost delivery clients.
//!
//! Two ways of getting a message into Mattermost, with different
//! capabilities:
//!
//! - [`MattermostClient`] talks to the REST API with a bot token and can
//!   thread replies under a root post. It backs the bridge's
//!   `ChatGateway` seam.
//! - [`IncomingWebhookClient`] posts to a fixed incoming-webhook URL. No
//!   threading, no channel choice, but it needs no bot account. It backs
//!   the `FallbackNotifier` seam.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use bridge_core::{ChatGateway, DispatchError, FallbackNotifier, PostedMessage};

pub mod errors;

pub use errors::Error;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Upper bound for any single outbound call.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Display name attached to incoming-webhook notifications.
const WEBHOOK_USERNAME: &str = "Forgejo Bot";

/// Avatar attached to incoming-webhook notifications.
const WEBHOOK_ICON_URL: &str = "https://forgejo.org/favicon.ico";

pub(crate) fn http_client() -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Request body for `POST /api/v4/posts`.
#[derive(Debug, Serialize)]
struct CreatePostPayload<'a> {
    channel_id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_id: Option<&'a str>,
}

/// The subset of a Mattermost post the bridge reads back.
#[derive(Debug, Deserialize)]
pub struct Post {
    /// Post id, used as the thread root for later replies.
    #[serde(default)]
    pub id: String,
}

/// Request body for an incoming-webhook notification.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    username: &'static str,
    icon_url: &'static str,
}

/// Mattermost REST API client authenticated with a bot token.
pub struct MattermostClient {
    api_url: String,
    token: String,
    http: reqwest::Client,
}

impl MattermostClient {
    /// Create a client for the Mattermost instance at `api_url` using the
    /// given bot `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(api_url: &str, token: &str) -> Result<Self, Error> {
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http: http_client()?,
        })
    }

    /// Post `message` into `channel_id`, threaded under `root_id` when given.
    pub async fn create_post(
        &self,
        channel_id: &str,
        message: &str,
        root_id: Option<&str>,
    ) -> Result<Post, Error> {
        let url = format!("{}/api/v4/posts", self.api_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&CreatePostPayload {
                channel_id,
                message,
                root_id,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(
                channel_id,
                status = response.status().as_u16(),
                "post creation rejected"
            );
            return Err(Error::Status(
                response.status().as_u16(),
                "posting message",
            ));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChatGateway for MattermostClient {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &str,
        root_id: Option<&str>,
    ) -> Result<PostedMessage, DispatchError> {
        let post = self
            .create_post(channel_id, message, root_id)
            .await
            .map_err(|error| DispatchError::Delivery(error.to_string()))?;

        Ok(PostedMessage { id: post.id })
    }
}

/// Client for a Mattermost incoming-webhook URL.
pub struct IncomingWebhookClient {
    webhook_url: String,
    http: reqwest::Client,
}

impl IncomingWebhookClient {
    /// Create a client posting to the given incoming-webhook URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(webhook_url: &str) -> Result<Self, Error> {
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            http: http_client()?,
        })
    }

    /// Send `text` through the webhook.
    pub async fn send(&self, text: &str) -> Result<(), Error> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(&WebhookPayload {
                text,
                username: WEBHOOK_USERNAME,
                icon_url: WEBHOOK_ICON_URL,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Status(
                response.status().as_u16(),
                "sending webhook notification",
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl FallbackNotifier for IncomingWebhookClient {
    async fn notify(&self, message: &str) -> Result<(), DispatchError> {
        self.send(message)
            .await
            .map_err(|error| DispatchError::Delivery(error.to_string()))
    }
}
