//! Markdown message rendering for chat notifications and issue bodies.

use chrono::{DateTime, Utc};

use crate::events::{IssueCommentEvent, IssueEvent, PullRequestEvent};

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;

/// Notification for a new comment on an issue.
pub fn comment_notification(event: &IssueCommentEvent) -> String {
    format!(
        "💬 **New Comment on Issue**\n\n\
         **Repository:** {}/{}\n\
         **Issue #{}:** {}\n\
         **Comment by:** @{}\n\n\
         **Comment:**\n{}\n\n\
         **URL:** {}",
        event.repository.owner.login,
        event.repository.name,
        event.issue.number,
        event.issue.title,
        event.sender.display_login(),
        event.comment.body,
        event.comment.html_url,
    )
}

/// Notification for an issue opened on the code host.
pub fn issue_opened_notification(event: &IssueEvent) -> String {
    issue_state_notification("🆕 **New Issue Created**", "Created by", event)
}

/// Notification for an issue being closed.
pub fn issue_closed_notification(event: &IssueEvent) -> String {
    issue_state_notification("✅ **Issue Closed**", "Closed by", event)
}

/// Notification for an issue being reopened.
pub fn issue_reopened_notification(event: &IssueEvent) -> String {
    issue_state_notification("🔄 **Issue Reopened**", "Reopened by", event)
}

fn issue_state_notification(heading: &str, actor_label: &str, event: &IssueEvent) -> String {
    format!(
        "{}\n\n\
         **Repository:** {}/{}\n\
         **Issue #{}:** {}\n\
         **{}:** @{}\n\
         **URL:** {}",
        heading,
        event.repository.owner.login,
        event.repository.name,
        event.issue.number,
        event.issue.title,
        actor_label,
        event.sender.display_login(),
        event.issue.html_url,
    )
}

/// Notification for a pull request being opened.
pub fn pull_request_opened_notification(event: &PullRequestEvent) -> String {
    pull_request_notification("🔄 **New Pull Request**", "Created by", event)
}

/// Notification for a pull request being merged.
pub fn pull_request_merged_notification(event: &PullRequestEvent) -> String {
    pull_request_notification("✅ **Pull Request Merged**", "Merged by", event)
}

/// Notification for a pull request closed without merging.
pub fn pull_request_closed_notification(event: &PullRequestEvent) -> String {
    pull_request_notification("❌ **Pull Request Closed**", "Closed by", event)
}

fn pull_request_notification(
    heading: &str,
    actor_label: &str,
    event: &PullRequestEvent,
) -> String {
    format!(
        "{}\n\n\
         **Repository:** {}/{}\n\
         **PR #{}:** {}\n\
         **{}:** @{}\n\
         **URL:** {}",
        heading,
        event.repository.owner.login,
        event.repository.name,
        event.pull_request.number,
        event.pull_request.title,
        actor_label,
        event.sender.display_login(),
        event.pull_request.html_url,
    )
}

/// Inputs for rendering the body of a chat-created issue.
///
/// `user_body` being `None` is the explicit signal to fall back to a
/// synthesized description built from the title; the default never happens
/// implicitly at a call site.
#[derive(Debug, Clone)]
pub struct IssueBodyContext<'a> {
    /// Channel the command came from.
    pub channel_name: &'a str,

    /// Team domain of the workspace.
    pub team_domain: &'a str,

    /// Chat username of the issue creator.
    pub chat_username: &'a str,

    /// Code-host username the creator is connected as.
    pub forge_username: &'a str,

    /// Issue title.
    pub title: &'a str,

    /// Free-form body from the command text, when one was given.
    pub user_body: Option<&'a str>,

    /// Creation instant rendered into the header block.
    pub created_at: DateTime<Utc>,
}

/// Render the issue body: a provenance header followed by the user body or
/// a synthesized description containing the title.
pub fn issue_body(ctx: &IssueBodyContext<'_>) -> String {
    let description = match ctx.user_body {
        Some(body) => body.to_string(),
        None => format!("**Description:**\n{}", ctx.title),
    };

    format!(
        "## Issue created from Mattermost\n\n\
         **Channel:** {}\n\
         **Team:** {}\n\
         **Created by:** @{} (Forgejo: @{})\n\
         **Date:** {}\n\n\
         ---\n\n\
         {}",
        ctx.channel_name,
        ctx.team_domain,
        ctx.chat_username,
        ctx.forge_username,
        ctx.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        description,
    )
}

/// Confirmation posted to the channel after successful issue creation.
pub fn issue_created_confirmation(
    title: &str,
    owner: &str,
    repo: &str,
    number: u64,
    issue_url: &str,
    forge_username: &str,
) -> String {
    format!(
        "✅ **Issue Created Successfully!**\n\n\
         **Title:** {title}\n\
         **Repository:** {owner}/{repo}\n\
         **Issue #{number}:** {issue_url}\n\
         **Created as:** {forge_username}\n\n\
         *This thread will receive updates when the issue is updated.*"
    )
}
