//! Bridge server binary.
//!
//! Reads configuration from the environment, opens the SQLite database, and
//! serves the HTTP surface until interrupted. See [`bridge_api::config`] for
//! the recognized environment variables; `RUST_LOG` controls log filtering.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bridge_api::{ApiConfig, ApiServer, AppState, BridgeConfig, VERSION};
use bridge_store::BridgeDb;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(BridgeConfig::from_env()?);

    tracing::info!(version = VERSION, "starting forgejo-mattermost-bridge");
    tracing::info!(
        forgejo_url = %config.forgejo_url,
        database = %config.database_path.display(),
        signature_verification = config.webhook_secret.is_some(),
        chat_api = config.chat_api().is_some(),
        incoming_webhook = config.incoming_webhook_url.is_some(),
        "configuration loaded"
    );

    let db = BridgeDb::open(&config.database_path)?;
    let state = AppState::new(Arc::clone(&config), &db)?;

    let server = ApiServer::new(
        ApiConfig {
            port: config.port,
            host: config.host.clone(),
        },
        state,
    );

    server.serve().await
}
