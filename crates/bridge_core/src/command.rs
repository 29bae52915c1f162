//! Slash-command text parsing.
//!
//! Command text arrives as the free-form `text` field of a chat slash
//! command. The first line carries `<owner> <repo> <title>`; any further
//! lines become the issue body. A handful of control keywords take
//! precedence over the owner/repo/title form.

use crate::errors::CommandError;

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

/// Chat context delivered alongside the command text.
///
/// These fields come straight from the slash-command form payload and are
/// carried through to issue body rendering and thread correlation.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    /// Chat platform user id of the invoker.
    pub user_id: String,

    /// Chat username of the invoker.
    pub user_name: String,

    /// Channel the command was issued in.
    pub channel_id: String,

    /// Human-readable channel name.
    pub channel_name: String,

    /// Team domain of the workspace.
    pub team_domain: String,
}

/// A parsed issue-creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    /// Repository owner.
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// Issue title, with one layer of surrounding quotes stripped.
    pub title: String,

    /// Free-form issue body from the lines after the first, when present.
    ///
    /// `None` is made explicit downstream: the rendered issue body falls
    /// back to a synthesized description containing the title.
    pub body: Option<String>,
}

/// The structured form of a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// Empty or whitespace-only text: show usage guidance.
    Help,

    /// `auth`, `login`, or `connect`: start the authorization flow.
    BeginAuth,

    /// `status`: report credential state and expiry.
    Status,

    /// `reset` or `reauth`: delete the stored credential and restart
    /// authorization.
    Reset,

    /// `<owner> <repo> <title> [body…]`: create an issue.
    CreateIssue(IssueRequest),
}

/// Parse raw slash-command text into a [`SlashCommand`].
///
/// Control keywords are checked before the three-token split, so `status`
/// never parses as a repository owner. Empty text is the help request, not
/// an error.
///
/// # Errors
///
/// Returns [`CommandError::MissingParameters`] when the first line holds
/// fewer than three tokens; callers answer with usage guidance rather than
/// an HTTP error.
pub fn parse_command(text: &str) -> Result<SlashCommand, CommandError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(SlashCommand::Help);
    }

    // Control keywords only match the whole command text.
    match trimmed {
        "auth" | "login" | "connect" => return Ok(SlashCommand::BeginAuth),
        "status" => return Ok(SlashCommand::Status),
        "reset" | "reauth" => return Ok(SlashCommand::Reset),
        _ => {}
    }

    let (first_line, rest) = match trimmed.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest),
        None => (trimmed, ""),
    };

    let (owner, after_owner) = first_line
        .split_once(char::is_whitespace)
        .ok_or(CommandError::MissingParameters)?;
    let (repo, title_part) = after_owner
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or(CommandError::MissingParameters)?;

    let title = strip_quotes(title_part.trim()).to_string();
    if title.is_empty() {
        return Err(CommandError::MissingParameters);
    }

    let body = rest.trim();
    let body = if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    };

    Ok(SlashCommand::CreateIssue(IssueRequest {
        owner: owner.to_string(),
        repo: repo.to_string(),
        title,
        body,
    }))
}

/// Strip one layer of surrounding single or double quotes.
fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
