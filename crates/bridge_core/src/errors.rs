//! Error types for the bridge domain logic.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors from forming or parsing an issue key.
///
/// An issue key is only ever constructed from non-empty owner and repository
/// names and a non-zero issue number; these variants enumerate the ways a
/// candidate key can violate that invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueKeyError {
    /// The owner segment was empty.
    #[error("issue key owner must not be empty")]
    EmptyOwner,

    /// The repository segment was empty.
    #[error("issue key repository must not be empty")]
    EmptyRepository,

    /// The issue number was zero.
    #[error("issue number must be non-zero")]
    ZeroNumber,

    /// A serialized key did not match the `owner/repo#number` shape.
    #[error("malformed issue key: {0}")]
    Malformed(String),
}

/// Slash-command text that cannot be turned into a structured command.
///
/// These are user-facing validation failures, not server errors; the HTTP
/// layer answers them with a 200 and usage guidance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The first line held fewer than the three required tokens.
    #[error("missing parameter: expected `<owner> <repo> <title>`")]
    MissingParameters,
}

/// Failures reported by notification delivery collaborators.
///
/// Dispatch failures are always logged and swallowed by the dispatcher; they
/// never propagate into the inbound request that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The chat API or incoming webhook call failed.
    #[error("chat delivery failed: {0}")]
    Delivery(String),

    /// The correlation lookup failed.
    #[error("correlation lookup failed: {0}")]
    Lookup(String),
}
