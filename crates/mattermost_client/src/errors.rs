//! Error types for the Mattermost clients.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised by the Mattermost REST and incoming-webhook clients.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connect, timeout, body decode).
    #[error("mattermost http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Mattermost answered with a non-success status.
    #[error("mattermost returned status {0} while {1}")]
    Status(u16, &'static str),
}
