//! HTTP request handlers.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use bridge_core::{verify_webhook_signature, EventOutcome, SIGNATURE_HEADER};
use forgejo_client::ForgejoClient;

use crate::errors::ApiError;
use crate::models::{
    AuthCallbackResponse, FeatureFlags, HealthResponse, ServiceBanner, SlashForm, WebhookAck,
};
use crate::{slash, AppState, VERSION};

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

/// `GET /` service banner.
pub async fn root() -> Json<ServiceBanner> {
    Json(ServiceBanner {
        service: "forgejo-mattermost-bridge",
        status: "running",
        version: VERSION,
        endpoints: vec!["/", "/webhook", "/auth/connect", "/auth/callback", "/health"],
    })
}

/// `GET /health` liveness probe.
///
/// Reports which optional features are configured as booleans only; secret
/// values never appear in the response.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: VERSION,
        features: FeatureFlags {
            signature_verification: state.config.webhook_secret.is_some(),
            slash_token: state.config.slash_token.is_some(),
            chat_api: state.chat.is_some(),
            incoming_webhook: state.config.incoming_webhook_url.is_some(),
        },
    })
}

/// `GET|POST /webhook`: single entry point for slash commands and code-host
/// events, discriminated by content type.
pub async fn webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if method == Method::GET {
        // Probe from the chat platform's webhook configuration screen.
        return Ok(Json(WebhookAck { status: "ok" }).into_response());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let form = SlashForm::from_form_body(&body);
        let response = slash::handle_slash(&state, &form).await?;
        return Ok(Json(response).into_response());
    }

    if content_type.starts_with("application/json") {
        return handle_code_host_event(&state, &headers, &body).await;
    }

    Err(ApiError::Validation("Unsupported content type".to_string()))
}

async fn handle_code_host_event(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let secret = state.config.webhook_secret.as_deref().unwrap_or("");

    if !verify_webhook_signature(signature, body, secret) {
        return Err(ApiError::Authentication(
            "invalid webhook signature".to_string(),
        ));
    }

    let payload: serde_json::Value = serde_json::from_slice(body)
        .map_err(|error| ApiError::Validation(format!("invalid JSON payload: {error}")))?;

    let status = match state.events.route(&payload).await {
        EventOutcome::Processed => "processed",
        EventOutcome::Ignored => "ignored",
    };

    Ok(Json(WebhookAck { status }).into_response())
}

/// Query parameters of `GET /auth/connect`.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    /// Chat user id starting the flow.
    #[serde(default)]
    pub user_id: String,

    /// Chat username, carried for the stored credential.
    #[serde(default)]
    pub username: String,
}

/// `GET /auth/connect`: start the OAuth2 flow for a chat user.
pub async fn auth_connect(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> Result<Redirect, ApiError> {
    if params.user_id.is_empty() {
        return Err(ApiError::Validation("user_id is required".to_string()));
    }

    let csrf_state = state.sessions.begin(&params.user_id, &params.username);
    let url = state
        .oauth
        .authorize_url(&state.config.redirect_uri(), &csrf_state);

    tracing::info!(user_id = %params.user_id, "starting authorization flow");
    Ok(Redirect::temporary(&url))
}

/// Query parameters of `GET /auth/callback`.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code issued by the code host.
    pub code: Option<String>,

    /// CSRF state issued by `/auth/connect`.
    pub state: Option<String>,

    /// Error reported by the code host instead of a code.
    pub error: Option<String>,

    /// Human-readable error detail, when the provider sends one.
    pub error_description: Option<String>,
}

/// `GET /auth/callback`: redeem the authorization code and store the
/// credential.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<(StatusCode, Json<AuthCallbackResponse>), ApiError> {
    if let Some(error) = params.error {
        let detail = params.error_description.unwrap_or_default();
        return Err(ApiError::Validation(format!(
            "authorization denied by code host: {error} {detail}"
        )));
    }

    let (Some(code), Some(csrf_state)) = (params.code, params.state) else {
        return Err(ApiError::Validation(
            "code and state are required".to_string(),
        ));
    };

    let Some(pending) = state.sessions.take(&csrf_state) else {
        return Err(ApiError::Authentication(
            "unknown or expired authorization state".to_string(),
        ));
    };

    let grant = state
        .oauth
        .exchange_code(&code, &state.config.redirect_uri())
        .await?;

    let forge = ForgejoClient::new(&state.config.forgejo_url, &grant.access_token)
        .map_err(|error| ApiError::Internal(error.into()))?;
    let user = forge.current_user().await?;

    state
        .tokens
        .put(&pending.user_id, &pending.username, &grant, &user.login)?;

    tracing::info!(
        user_id = %pending.user_id,
        forgejo_username = %user.login,
        "linked chat user to code-host account"
    );

    Ok((
        StatusCode::OK,
        Json(AuthCallbackResponse {
            status: "connected",
            message: format!(
                "Forgejo account @{} connected. You can close this window \
                 and return to Mattermost.",
                user.login
            ),
            forgejo_username: user.login,
        }),
    ))
}

/// `GET|POST /debug`: request echo plus boolean configuration presence.
/// Compiled only into debug builds.
#[cfg(debug_assertions)]
pub async fn debug_echo(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Json<serde_json::Value> {
    let header_names: Vec<String> = headers
        .keys()
        .map(|name| name.as_str().to_string())
        .collect();

    Json(serde_json::json!({
        "method": method.as_str(),
        "headers": header_names,
        "body_bytes": body.len(),
        "config": {
            "webhook_secret": state.config.webhook_secret.is_some(),
            "slash_token": state.config.slash_token.is_some(),
            "chat_api": state.chat.is_some(),
            "incoming_webhook": state.config.incoming_webhook_url.is_some(),
        },
    }))
}
