//! Forgejo REST client.
//!
//! Thin wrapper over the Forgejo (Gitea-compatible) HTTP API, covering the
//! calls this bridge performs with a user's delegated token: identity lookup,
//! repository access checks, and issue creation. OAuth2 authorization lives
//! in [`oauth`].
//!
//! All clients carry an explicit 10-second timeout; no call may stall an
//! inbound webhook handler indefinitely.

use std::time::Duration;

use reqwest::StatusCode;

pub mod errors;
pub mod models;
pub mod oauth;

pub use errors::Error;
pub use models::{CreateIssuePayload, ForgejoUser, Issue};
pub use oauth::OAuthClient;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Upper bound for any single outbound call.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> Result<reqwest::Client, Error> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Forgejo API client authenticated with a user's access token.
pub struct ForgejoClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl ForgejoClient {
    /// Create a client for `base_url` using `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, Error> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: access_token.to_string(),
            http: http_client()?,
        })
    }

    /// Fetch the account the token belongs to.
    pub async fn current_user(&self) -> Result<ForgejoUser, Error> {
        let url = format!("{}/api/v1/user", self.base_url);
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;

        if !response.status().is_success() {
            return Err(Error::Status(
                response.status().as_u16(),
                "fetching current user",
            ));
        }

        Ok(response.json().await?)
    }

    /// Whether the token can see `owner/repo`.
    ///
    /// Any failure (not-found, forbidden, network error) reads as "no
    /// access"; callers only need the boolean.
    pub async fn repo_accessible(&self, owner: &str, repo: &str) -> bool {
        let url = format!("{}/api/v1/repos/{}/{}", self.base_url, owner, repo);

        match self.http.get(&url).bearer_auth(&self.token).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(error) => {
                tracing::warn!(owner, repo, %error, "repository access check failed");
                false
            }
        }
    }

    /// Create an issue in `owner/repo`.
    pub async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<Issue, Error> {
        let url = format!("{}/api/v1/repos/{}/{}/issues", self.base_url, owner, repo);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&CreateIssuePayload { title, body })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(
                owner,
                repo,
                status = response.status().as_u16(),
                "issue creation rejected"
            );
            return Err(Error::Status(response.status().as_u16(), "creating issue"));
        }

        let issue: Issue = response.json().await?;
        tracing::info!(owner, repo, number = issue.number, "created issue");
        Ok(issue)
    }
}
