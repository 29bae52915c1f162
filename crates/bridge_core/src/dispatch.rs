//! Notification routing between chat threads, channels, and webhooks.
//!
//! The dispatcher decides, per outbound message, whether to reply into an
//! existing chat thread, post a new channel message, or fall back to a
//! fire-and-forget incoming-webhook notification. The decision depends on
//! the stored correlation for the issue and on which chat credentials are
//! configured.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::DispatchError;
use crate::issue_key::IssueKey;
use crate::models::ThreadCorrelation;

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

/// A message successfully posted through the chat API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    /// Chat platform id of the created post.
    pub id: String,
}

/// Chat-API gateway used for threaded and channel messages.
///
/// Implemented by the Mattermost REST client; mocked in tests.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Post `message` into `channel_id`, threaded under `root_id` when given.
    async fn post_message(
        &self,
        channel_id: &str,
        message: &str,
        root_id: Option<&str>,
    ) -> Result<PostedMessage, DispatchError>;
}

/// Fire-and-forget notification sink with no threading support.
///
/// Implemented by the incoming-webhook client.
#[async_trait]
pub trait FallbackNotifier: Send + Sync {
    /// Deliver `message` best-effort.
    async fn notify(&self, message: &str) -> Result<(), DispatchError>;
}

/// Read access to the issue↔thread correlation table.
pub trait CorrelationSource: Send + Sync {
    /// Look up the correlation for `key`, if one was ever stored.
    fn correlation(&self, key: &IssueKey) -> Result<Option<ThreadCorrelation>, DispatchError>;
}

/// How a dispatched message was (or was not) delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Posted as a threaded reply under the stored root message.
    ThreadReply,

    /// Posted as a new, un-threaded message to the stored channel.
    ChannelMessage,

    /// Sent through the incoming-webhook fallback.
    FallbackNotification,

    /// Nothing was delivered: no route was configured, or delivery failed.
    Dropped,
}

/// Decides and performs notification delivery for code-host events.
///
/// Delivery failures are logged and swallowed here; they must never fail the
/// inbound webhook request that triggered the notification, since the code
/// host cannot do anything useful with a retry.
pub struct NotificationDispatcher {
    correlations: Arc<dyn CorrelationSource>,
    chat: Option<Arc<dyn ChatGateway>>,
    fallback: Option<Arc<dyn FallbackNotifier>>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over the given correlation source and whichever
    /// delivery routes are configured.
    pub fn new(
        correlations: Arc<dyn CorrelationSource>,
        chat: Option<Arc<dyn ChatGateway>>,
        fallback: Option<Arc<dyn FallbackNotifier>>,
    ) -> Self {
        Self {
            correlations,
            chat,
            fallback,
        }
    }

    /// Deliver `message` for the issue identified by `key`.
    ///
    /// Routing, in order:
    /// 1. correlation + chat API + root message id → threaded reply;
    /// 2. correlation + chat API, no root id → new channel message;
    /// 3. otherwise → incoming-webhook fallback, when configured.
    pub async fn dispatch(&self, key: &IssueKey, message: &str) -> DispatchOutcome {
        let correlation = match self.correlations.correlation(key) {
            Ok(correlation) => correlation,
            Err(error) => {
                tracing::error!(issue_key = %key, %error, "correlation lookup failed");
                None
            }
        };

        if let (Some(correlation), Some(chat)) = (&correlation, &self.chat) {
            return self.deliver_via_chat(key, chat, correlation, message).await;
        }

        self.notify_fallback(message).await
    }

    /// Deliver `message` through the incoming-webhook fallback only.
    ///
    /// Used for events that are never threaded, such as pull requests.
    pub async fn notify_fallback(&self, message: &str) -> DispatchOutcome {
        let Some(fallback) = &self.fallback else {
            tracing::warn!("notification dropped: no delivery route configured");
            return DispatchOutcome::Dropped;
        };

        match fallback.notify(message).await {
            Ok(()) => DispatchOutcome::FallbackNotification,
            Err(error) => {
                tracing::error!(%error, "incoming-webhook notification failed");
                DispatchOutcome::Dropped
            }
        }
    }

    async fn deliver_via_chat(
        &self,
        key: &IssueKey,
        chat: &Arc<dyn ChatGateway>,
        correlation: &ThreadCorrelation,
        message: &str,
    ) -> DispatchOutcome {
        let root_id = correlation.root_message_id.as_deref();
        let result = chat
            .post_message(&correlation.channel_id, message, root_id)
            .await;

        match (result, root_id) {
            (Ok(_), Some(root_id)) => {
                tracing::info!(issue_key = %key, root_id, "posted threaded reply");
                DispatchOutcome::ThreadReply
            }
            (Ok(_), None) => {
                tracing::info!(issue_key = %key, "posted channel message (no root id stored)");
                DispatchOutcome::ChannelMessage
            }
            (Err(error), _) => {
                tracing::error!(issue_key = %key, %error, "chat message delivery failed");
                DispatchOutcome::Dropped
            }
        }
    }
}
