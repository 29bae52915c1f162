//! Error types for store operations.

use bridge_core::IssueKeyError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur while reading or writing the bridge database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An underlying SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("database lock poisoned")]
    LockPoisoned,

    /// A stored timestamp column held a value that is not RFC 3339.
    #[error("invalid timestamp in column {column}: {value}")]
    InvalidTimestamp {
        /// Column the bad value was read from.
        column: &'static str,
        /// The offending stored value.
        value: String,
    },

    /// A stored issue key no longer parses.
    #[error("invalid issue key in storage: {0}")]
    InvalidIssueKey(#[from] IssueKeyError),
}
