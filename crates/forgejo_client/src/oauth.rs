//! OAuth2 delegated authorization against Forgejo.
//!
//! Covers the two calls the bridge makes: building the authorization
//! redirect URL and exchanging an authorization code for a token. CSRF
//! `state` generation and verification belong to the HTTP layer, which owns
//! the session store.

use bridge_core::TokenGrant;
use url::Url;

use crate::errors::Error;
use crate::http_client;

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;

/// Scopes requested from the code host.
pub const OAUTH_SCOPE: &str = "read:user,read:repository,write:repository,write:issue";

/// OAuth2 client for Forgejo's `/login/oauth` endpoints.
pub struct OAuthClient {
    base_url: String,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Create an OAuth2 client for the application registered on the code
    /// host.
    pub fn new(base_url: &str, client_id: &str, client_secret: &str) -> Result<Self, Error> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            http: http_client()?,
        })
    }

    /// Build the authorization URL the user is redirected to.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        let mut url = match Url::parse(&format!("{}/login/oauth/authorize", self.base_url)) {
            Ok(url) => url,
            Err(_) => return format!("{}/login/oauth/authorize", self.base_url),
        };

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", OAUTH_SCOPE)
            .append_pair("state", state);

        url.to_string()
    }

    /// Exchange an authorization code for a token grant.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, Error> {
        let url = format!("{}/login/oauth/access_token", self.base_url);
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!(
                status = response.status().as_u16(),
                "token exchange rejected"
            );
            return Err(Error::Status(
                response.status().as_u16(),
                "exchanging authorization code",
            ));
        }

        Ok(response.json().await?)
    }
}
