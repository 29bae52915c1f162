//! HTTP routing configuration.
//!
//! - `GET  /`              service banner
//! - `GET|POST /webhook`   slash commands and code-host events
//! - `GET  /auth/connect`  start the OAuth2 flow
//! - `GET  /auth/callback` finish the OAuth2 flow
//! - `GET  /health`        liveness probe
//! - `GET|POST /debug`     request echo (debug builds only)

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::{handlers, AppState};

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

/// Create the complete router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new())
        .on_response(DefaultOnResponse::new());

    let timeout_layer = TimeoutLayer::new(Duration::from_secs(30));

    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/webhook", get(handlers::webhook).post(handlers::webhook))
        .route("/auth/connect", get(handlers::auth_connect))
        .route("/auth/callback", get(handlers::auth_callback))
        .route("/health", get(handlers::health));

    #[cfg(debug_assertions)]
    let router = router.route(
        "/debug",
        get(handlers::debug_echo).post(handlers::debug_echo),
    );

    router
        .layer(timeout_layer)
        .layer(trace_layer)
        .with_state(state)
}
