//! HTTP surface of the Forgejo ↔ Mattermost bridge.
//!
//! This crate wires the domain logic, the stores, and the outbound clients
//! into an axum application:
//! - slash commands and code-host webhooks arrive on a single `/webhook`
//!   endpoint, discriminated by content type;
//! - `/auth/connect` and `/auth/callback` carry the OAuth2 authorization
//!   flow for linking a chat user to a code-host account;
//! - `/` and `/health` answer discovery and liveness probes.
//!
//! This crate exists at the HTTP layer and handles request/response
//! translation, error mapping, and server lifecycle. Relay policy lives in
//! `bridge_core`; this crate never re-implements it.

use std::sync::Arc;

use bridge_core::{ChatGateway, EventRouter, FallbackNotifier, NotificationDispatcher};
use bridge_store::{BridgeDb, CorrelationStore, TokenStore};
use forgejo_client::OAuthClient;
use mattermost_client::{IncomingWebhookClient, MattermostClient};

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod slash;

pub use config::BridgeConfig;
pub use errors::ApiError;
pub use server::{ApiConfig, ApiServer};
pub use sessions::AuthSessions;

/// Service version reported by the banner and health endpoints.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default port to listen on.
pub const DEFAULT_PORT: u16 = 8080;

/// Application state shared across handlers.
///
/// Cloning is cheap; everything mutable sits behind an `Arc` or a store
/// handle that shares its connection.
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration.
    pub config: Arc<BridgeConfig>,

    /// Credential store.
    pub tokens: TokenStore,

    /// Issue ↔ thread correlation store.
    pub correlations: CorrelationStore,

    /// Webhook event router.
    pub events: Arc<EventRouter>,

    /// OAuth2 client against the code host.
    pub oauth: Arc<OAuthClient>,

    /// Chat REST client, when bot credentials are configured.
    pub chat: Option<Arc<MattermostClient>>,

    /// Pending OAuth2 authorization sessions.
    pub sessions: Arc<AuthSessions>,
}

impl AppState {
    /// Assemble the application state from configuration and an open
    /// database.
    ///
    /// # Errors
    ///
    /// Returns an error when one of the outbound HTTP clients cannot be
    /// built.
    pub fn new(config: Arc<BridgeConfig>, db: &BridgeDb) -> anyhow::Result<Self> {
        let tokens = db.tokens();
        let correlations = db.correlations();

        let chat = match config.chat_api() {
            Some((api_url, token)) => Some(Arc::new(MattermostClient::new(api_url, token)?)),
            None => None,
        };

        let fallback: Option<Arc<dyn FallbackNotifier>> = match &config.incoming_webhook_url {
            Some(url) => Some(Arc::new(IncomingWebhookClient::new(url)?)),
            None => None,
        };

        let chat_gateway = chat
            .clone()
            .map(|client| client as Arc<dyn ChatGateway>);

        let dispatcher = Arc::new(NotificationDispatcher::new(
            Arc::new(correlations.clone()),
            chat_gateway,
            fallback,
        ));
        let events = Arc::new(EventRouter::new(
            Arc::new(correlations.clone()),
            dispatcher,
        ));

        let oauth = Arc::new(OAuthClient::new(
            &config.forgejo_url,
            &config.client_id,
            &config.client_secret,
        )?);

        Ok(Self {
            config,
            tokens,
            correlations,
            events,
            oauth,
            chat,
            sessions: Arc::new(AuthSessions::default()),
        })
    }
}
