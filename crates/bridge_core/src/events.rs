//! Webhook payload classification and event routing.
//!
//! Code-host webhook payloads are duck-typed: which event arrived is
//! determined by which top-level keys are present, combined with the
//! `action` field. [`classify`] turns a decoded payload into a tagged union
//! exactly once; handlers never re-probe key presence.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::dispatch::{CorrelationSource, NotificationDispatcher};
use crate::errors::IssueKeyError;
use crate::issue_key::IssueKey;
use crate::messages;

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

/// Repository fragment of a webhook payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRepository {
    /// Repository name.
    #[serde(default)]
    pub name: String,

    /// Repository owner.
    #[serde(default)]
    pub owner: EventActor,
}

/// An account referenced by a webhook payload (owner, sender, author).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventActor {
    /// Login name; empty when the payload omitted it.
    #[serde(default)]
    pub login: String,
}

impl EventActor {
    /// Login for display purposes, with a placeholder for absent values.
    pub fn display_login(&self) -> &str {
        if self.login.is_empty() {
            "Unknown"
        } else {
            &self.login
        }
    }
}

/// Issue fragment of a webhook payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventIssue {
    /// Issue number within the repository.
    #[serde(default)]
    pub number: u64,

    /// Issue title.
    #[serde(default)]
    pub title: String,

    /// Web URL of the issue.
    #[serde(default)]
    pub html_url: String,

    /// Current state (`open` or `closed`) as reported by the payload.
    #[serde(default)]
    pub state: String,
}

/// Comment fragment of an issue-comment payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventComment {
    /// Comment body.
    #[serde(default)]
    pub body: String,

    /// Web URL of the comment.
    #[serde(default)]
    pub html_url: String,
}

/// Pull-request fragment of a webhook payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPullRequest {
    /// Pull-request number within the repository.
    #[serde(default)]
    pub number: u64,

    /// Pull-request title.
    #[serde(default)]
    pub title: String,

    /// Web URL of the pull request.
    #[serde(default)]
    pub html_url: String,

    /// Whether a `closed` pull request was merged.
    #[serde(default)]
    pub merged: bool,
}

/// A new comment on an issue.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    /// Event action (`created`, `edited`, …).
    #[serde(default)]
    pub action: String,

    /// The commented issue.
    pub issue: EventIssue,

    /// The comment itself.
    pub comment: EventComment,

    /// Repository the issue belongs to.
    #[serde(default)]
    pub repository: EventRepository,

    /// Account that triggered the event.
    #[serde(default)]
    pub sender: EventActor,
}

/// An issue state change (`opened`, `closed`, `reopened`, …).
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEvent {
    /// Event action.
    #[serde(default)]
    pub action: String,

    /// The affected issue.
    pub issue: EventIssue,

    /// Repository the issue belongs to.
    #[serde(default)]
    pub repository: EventRepository,

    /// Account that triggered the event.
    #[serde(default)]
    pub sender: EventActor,
}

/// A pull-request event (`opened`, `closed`, …).
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// Event action.
    #[serde(default)]
    pub action: String,

    /// The affected pull request.
    pub pull_request: EventPullRequest,

    /// Repository the pull request belongs to.
    #[serde(default)]
    pub repository: EventRepository,

    /// Account that triggered the event.
    #[serde(default)]
    pub sender: EventActor,
}

/// Tagged union over the webhook payload shapes this bridge consumes.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// Payload carried both `comment` and `issue`.
    IssueComment(IssueCommentEvent),

    /// Payload carried `issue` without `comment`.
    Issue(IssueEvent),

    /// Payload carried `pull_request`.
    PullRequest(PullRequestEvent),

    /// Anything else; acknowledged and ignored.
    Unclassified,
}

/// Classify a decoded webhook payload.
///
/// First match wins: `comment`+`issue` → issue-comment (even when a
/// `pull_request` key is also present), then `issue` → issue-state, then
/// `pull_request` → pull-request, else unclassified.
pub fn classify(payload: &Value) -> WebhookEvent {
    let has = |key: &str| payload.get(key).is_some();

    if has("comment") && has("issue") {
        return deserialize_or_unclassified(payload, WebhookEvent::IssueComment);
    }
    if has("issue") {
        return deserialize_or_unclassified(payload, WebhookEvent::Issue);
    }
    if has("pull_request") {
        return deserialize_or_unclassified(payload, WebhookEvent::PullRequest);
    }

    WebhookEvent::Unclassified
}

fn deserialize_or_unclassified<T, F>(payload: &Value, wrap: F) -> WebhookEvent
where
    T: for<'de> Deserialize<'de>,
    F: FnOnce(T) -> WebhookEvent,
{
    match serde_json::from_value::<T>(payload.clone()) {
        Ok(event) => wrap(event),
        Err(error) => {
            tracing::warn!(%error, "webhook payload did not deserialize, treating as unclassified");
            WebhookEvent::Unclassified
        }
    }
}

impl IssueCommentEvent {
    /// Issue key of the commented issue.
    pub fn issue_key(&self) -> Result<IssueKey, IssueKeyError> {
        IssueKey::new(
            self.repository.owner.login.clone(),
            self.repository.name.clone(),
            self.issue.number,
        )
    }
}

impl IssueEvent {
    /// Issue key of the affected issue.
    pub fn issue_key(&self) -> Result<IssueKey, IssueKeyError> {
        IssueKey::new(
            self.repository.owner.login.clone(),
            self.repository.name.clone(),
            self.issue.number,
        )
    }
}

/// Definite outcome of routing one payload.
///
/// The router never leaves a payload unacknowledged: every branch resolves
/// to one of these, and both map to a successful HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was understood; a notification may or may not have been
    /// sent depending on policy.
    Processed,

    /// The payload or action is not one this bridge relays.
    Ignored,
}

/// Routes classified webhook events to notification delivery.
pub struct EventRouter {
    correlations: Arc<dyn CorrelationSource>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl EventRouter {
    /// Create a router over the correlation table and the dispatcher.
    pub fn new(
        correlations: Arc<dyn CorrelationSource>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            correlations,
            dispatcher,
        }
    }

    /// Classify and handle one decoded payload.
    pub async fn route(&self, payload: &Value) -> EventOutcome {
        match classify(payload) {
            WebhookEvent::IssueComment(event) => self.handle_issue_comment(event).await,
            WebhookEvent::Issue(event) => self.handle_issue(event).await,
            WebhookEvent::PullRequest(event) => self.handle_pull_request(event).await,
            WebhookEvent::Unclassified => {
                tracing::info!("unrecognized webhook payload, acknowledging as ignored");
                EventOutcome::Ignored
            }
        }
    }

    async fn handle_issue_comment(&self, event: IssueCommentEvent) -> EventOutcome {
        let Ok(key) = event.issue_key() else {
            tracing::warn!(action = %event.action, "issue-comment payload without usable issue key");
            return EventOutcome::Ignored;
        };

        let message = messages::comment_notification(&event);
        self.dispatcher.dispatch(&key, &message).await;
        EventOutcome::Processed
    }

    async fn handle_issue(&self, event: IssueEvent) -> EventOutcome {
        let Ok(key) = event.issue_key() else {
            tracing::warn!(action = %event.action, "issue payload without usable issue key");
            return EventOutcome::Ignored;
        };

        match event.action.as_str() {
            "opened" => {
                // A chat-originated issue already has a correlation and its
                // thread already announced the creation; only code-host
                // originated issues are announced here.
                let already_known = matches!(self.correlations.correlation(&key), Ok(Some(_)));
                if already_known {
                    tracing::info!(issue_key = %key, "suppressing duplicate opened notification");
                } else {
                    let message = messages::issue_opened_notification(&event);
                    self.dispatcher.dispatch(&key, &message).await;
                }
                EventOutcome::Processed
            }
            "closed" => {
                // Guard against stale or duplicate deliveries: only notify
                // when the issue really is closed right now.
                if event.issue.state == "closed" {
                    let message = messages::issue_closed_notification(&event);
                    self.dispatcher.dispatch(&key, &message).await;
                }
                EventOutcome::Processed
            }
            "reopened" => {
                let message = messages::issue_reopened_notification(&event);
                self.dispatcher.dispatch(&key, &message).await;
                EventOutcome::Processed
            }
            other => {
                tracing::debug!(issue_key = %key, action = other, "issue action not relayed");
                EventOutcome::Processed
            }
        }
    }

    async fn handle_pull_request(&self, event: PullRequestEvent) -> EventOutcome {
        let message = match event.action.as_str() {
            "opened" => Some(messages::pull_request_opened_notification(&event)),
            "closed" if event.pull_request.merged => {
                Some(messages::pull_request_merged_notification(&event))
            }
            "closed" => Some(messages::pull_request_closed_notification(&event)),
            other => {
                tracing::debug!(action = other, "pull-request action not relayed");
                None
            }
        };

        // Pull requests are never threaded; they go straight to the
        // incoming-webhook fallback.
        if let Some(message) = message {
            self.dispatcher.notify_fallback(&message).await;
        }
        EventOutcome::Processed
    }
}
