//! Tests for slash-command handling.

use std::path::PathBuf;
use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bridge_core::TokenGrant;
use bridge_store::BridgeDb;

use crate::BridgeConfig;

use super::*;

fn test_config(forgejo_url: &str) -> BridgeConfig {
    BridgeConfig {
        forgejo_url: forgejo_url.trim_end_matches('/').to_string(),
        client_id: "client-1".to_string(),
        client_secret: "secret-1".to_string(),
        base_url: "https://bridge.example".to_string(),
        webhook_secret: None,
        slash_token: None,
        incoming_webhook_url: None,
        chat_api_url: None,
        chat_api_token: None,
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: PathBuf::from(":memory:"),
    }
}

fn test_state(config: BridgeConfig) -> (AppState, BridgeDb) {
    let db = BridgeDb::in_memory().unwrap();
    let state = AppState::new(Arc::new(config), &db).unwrap();
    (state, db)
}

fn form_with_text(text: &str) -> SlashForm {
    SlashForm {
        token: String::new(),
        text: text.to_string(),
        user_id: "u1".to_string(),
        user_name: "alice".to_string(),
        channel_id: "chan-1".to_string(),
        channel_name: "town-square".to_string(),
        team_domain: "acme-team".to_string(),
    }
}

fn seed_credential(state: &AppState) {
    let grant = TokenGrant {
        access_token: "forge-token".to_string(),
        refresh_token: None,
        expires_in: Some(3600),
    };
    state.tokens.put("u1", "alice", &grant, "alice-forge").unwrap();
}

#[tokio::test]
async fn test_wrong_static_token_is_rejected() {
    let mut config = test_config("https://forge.example");
    config.slash_token = Some("expected".to_string());
    let (state, _db) = test_state(config);

    let mut form = form_with_text("status");
    form.token = "wrong".to_string();

    let err = handle_slash(&state, &form).await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
}

#[tokio::test]
async fn test_matching_static_token_is_accepted() {
    let mut config = test_config("https://forge.example");
    config.slash_token = Some("expected".to_string());
    let (state, _db) = test_state(config);

    let mut form = form_with_text("");
    form.token = "expected".to_string();

    let response = handle_slash(&state, &form).await.unwrap();
    assert_eq!(response.response_type, Some("ephemeral"));
}

#[tokio::test]
async fn test_help_mentions_auth_when_not_connected() {
    let (state, _db) = test_state(test_config("https://forge.example"));

    let response = handle_slash(&state, &form_with_text("")).await.unwrap();
    let text = response.text.unwrap();
    assert!(text.contains("Not connected"));
    assert!(text.contains("/forgejo auth"));
}

#[tokio::test]
async fn test_missing_parameters_answer_with_usage_guidance() {
    let (state, _db) = test_state(test_config("https://forge.example"));

    let response = handle_slash(&state, &form_with_text("acme widgets")).await.unwrap();
    assert_eq!(response.response_type, Some("ephemeral"));
    assert!(response.text.unwrap().contains("Missing parameters"));
}

#[tokio::test]
async fn test_auth_command_returns_connect_link() {
    let (state, _db) = test_state(test_config("https://forge.example"));

    let response = handle_slash(&state, &form_with_text("auth")).await.unwrap();
    let text = response.text.unwrap();
    assert!(text.contains("https://bridge.example/auth/connect?user_id=u1&username=alice"));
}

#[tokio::test]
async fn test_status_reports_not_connected() {
    let (state, _db) = test_state(test_config("https://forge.example"));

    let response = handle_slash(&state, &form_with_text("status")).await.unwrap();
    let text = response.text.unwrap();
    assert!(text.contains("Not connected"));
    assert!(text.contains("/auth/connect"));
}

#[tokio::test]
async fn test_status_reports_connected_account_and_expiry() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    seed_credential(&state);

    let response = handle_slash(&state, &form_with_text("status")).await.unwrap();
    let text = response.text.unwrap();
    assert!(text.contains("@alice-forge"));
    assert!(text.contains("expires at"));
}

#[tokio::test]
async fn test_reset_without_session_says_so() {
    let (state, _db) = test_state(test_config("https://forge.example"));

    let response = handle_slash(&state, &form_with_text("reset")).await.unwrap();
    assert!(response.text.unwrap().contains("No stored Forgejo session"));
}

#[tokio::test]
async fn test_reset_clears_the_stored_credential() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    seed_credential(&state);

    let response = handle_slash(&state, &form_with_text("reset")).await.unwrap();
    assert!(response.text.unwrap().contains("cleared"));
    assert!(state.tokens.get("u1").unwrap().is_none());
}

#[tokio::test]
async fn test_create_issue_requires_a_credential() {
    let (state, _db) = test_state(test_config("https://forge.example"));

    let response = handle_slash(&state, &form_with_text("acme widgets Fix bug"))
        .await
        .unwrap();
    assert_eq!(response.response_type, Some("ephemeral"));
    assert!(response.text.unwrap().contains("Authentication required"));
}

#[tokio::test]
async fn test_create_issue_rejects_inaccessible_repository() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (state, _db) = test_state(test_config(&server.uri()));
    seed_credential(&state);

    let response = handle_slash(&state, &form_with_text("acme widgets Fix bug"))
        .await
        .unwrap();
    assert!(response.text.unwrap().contains("Repository not accessible"));
}

#[tokio::test]
async fn test_create_issue_without_chat_api_answers_in_channel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 5})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/repos/acme/widgets/issues"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "number": 12,
            "title": "Fix bug",
            "html_url": "https://forge.example/acme/widgets/issues/12",
            "state": "open"
        })))
        .mount(&server)
        .await;

    let (state, _db) = test_state(test_config(&server.uri()));
    seed_credential(&state);

    let response = handle_slash(&state, &form_with_text("acme widgets Fix bug"))
        .await
        .unwrap();

    assert_eq!(response.response_type, Some("in_channel"));
    assert!(response
        .text
        .unwrap()
        .contains("https://forge.example/acme/widgets/issues/12"));

    let key = IssueKey::new("acme".to_string(), "widgets".to_string(), 12).unwrap();
    let correlation = state.correlations.get(&key).unwrap().unwrap();
    assert_eq!(correlation.channel_id, "chan-1");
    assert!(correlation.root_message_id.is_none());
}

#[tokio::test]
async fn test_create_issue_threads_under_the_confirmation_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 5})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/repos/acme/widgets/issues"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "number": 12,
            "title": "Fix bug",
            "html_url": "https://forge.example/acme/widgets/issues/12",
            "state": "open"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v4/posts"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "root-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.chat_api_url = Some(server.uri());
    config.chat_api_token = Some("bot-token".to_string());
    let (state, _db) = test_state(config);
    seed_credential(&state);

    let response = handle_slash(&state, &form_with_text("acme widgets Fix bug"))
        .await
        .unwrap();

    // The confirmation already reached the channel through the chat API.
    assert_eq!(response, SlashResponse::empty());

    let key = IssueKey::new("acme".to_string(), "widgets".to_string(), 12).unwrap();
    let correlation = state.correlations.get(&key).unwrap().unwrap();
    assert_eq!(correlation.root_message_id.as_deref(), Some("root-1"));
}

#[tokio::test]
async fn test_create_issue_failure_answers_with_guidance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 5})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/repos/acme/widgets/issues"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (state, _db) = test_state(test_config(&server.uri()));
    seed_credential(&state);

    let response = handle_slash(&state, &form_with_text("acme widgets Fix bug"))
        .await
        .unwrap();
    assert_eq!(response.response_type, Some("ephemeral"));
    assert!(response.text.unwrap().contains("Failed to create issue"));
}

#[tokio::test]
async fn test_issue_body_carries_channel_provenance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 5})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/repos/acme/widgets/issues"))
        .and(wiremock::matchers::body_string_contains("town-square"))
        .and(wiremock::matchers::body_string_contains("alice-forge"))
        .and(wiremock::matchers::body_string_contains("More detail here"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "number": 13,
            "title": "Fix bug",
            "html_url": "https://forge.example/acme/widgets/issues/13",
            "state": "open"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (state, _db) = test_state(test_config(&server.uri()));
    seed_credential(&state);

    handle_slash(&state, &form_with_text("acme widgets Fix bug\nMore detail here"))
        .await
        .unwrap();
}
