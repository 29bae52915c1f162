//! Forgejo API payload types (only the fields this bridge consumes).

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// An issue as returned by the Forgejo issues API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    /// Issue number within the repository.
    pub number: u64,

    /// Issue title.
    pub title: String,

    /// Web URL of the issue.
    pub html_url: String,

    /// Current state (`open` or `closed`).
    #[serde(default)]
    pub state: String,
}

/// The authenticated Forgejo account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgejoUser {
    /// Account login name.
    pub login: String,
}

/// Request body for issue creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIssuePayload<'a> {
    /// Issue title.
    pub title: &'a str,

    /// Issue body (markdown).
    pub body: &'a str,
}
