//! Error types for Forgejo client operations.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur when talking to the Forgejo API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP request itself failed (connect, timeout, decode).
    #[error("Forgejo request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    ///
    /// Parameters: (status code, operation being performed)
    #[error("Forgejo returned status {0} while {1}")]
    Status(u16, &'static str),
}
