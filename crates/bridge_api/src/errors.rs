//! HTTP error mapping.
//!
//! Handlers return [`ApiError`] for failures that should surface as HTTP
//! error statuses. Slash-command validation problems are deliberately NOT
//! errors at this level: the chat platform renders a 200 ephemeral message
//! for those, so they stay inside the slash handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Failures a handler maps onto an HTTP error response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caller failed authentication (bad slash token, invalid webhook
    /// signature, unknown OAuth state).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The request itself is unusable.
    #[error("{0}")]
    Validation(String),

    /// An upstream service rejected or failed a call this request needed.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// Anything unexpected. The response body stays generic; detail goes to
    /// the log only.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<bridge_store::StoreError> for ApiError {
    fn from(error: bridge_store::StoreError) -> Self {
        ApiError::Internal(error.into())
    }
}

impl From<forgejo_client::Error> for ApiError {
    fn from(error: forgejo_client::Error) -> Self {
        ApiError::Upstream(error.to_string())
    }
}

impl From<mattermost_client::Error> for ApiError {
    fn from(error: mattermost_client::Error) -> Self {
        ApiError::Upstream(error.to_string())
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Internal detail never leaves the process.
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match status {
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::BAD_GATEWAY => {
                tracing::error!(%status, error = %self, "request failed");
            }
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(%status, error = %self, "request rejected");
            }
            _ => {
                tracing::info!(%status, error = %self, "request rejected");
            }
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
