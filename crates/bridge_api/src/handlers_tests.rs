//! Router-level tests for the HTTP surface.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use hmac::Mac;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method as http_method, path as url_path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bridge_core::{IssueKey, TokenGrant};
use bridge_store::BridgeDb;

use crate::routes::create_router;
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

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_banner_lists_endpoints() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["service"], "forgejo-mattermost-bridge");
    assert!(json["endpoints"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("/webhook")));
}

#[tokio::test]
async fn test_health_reports_feature_booleans_without_secrets() {
    let mut config = test_config("https://forge.example");
    config.webhook_secret = Some("s3cr3t".to_string());
    let (state, _db) = test_state(config);

    let response = create_router(state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes_json = body_json(response).await;
    assert_eq!(bytes_json["status"], "ok");
    assert_eq!(bytes_json["features"]["signature_verification"], true);
    assert_eq!(bytes_json["features"]["chat_api"], false);
    assert!(!bytes_json.to_string().contains("s3cr3t"));
}

#[tokio::test]
async fn test_webhook_get_is_acknowledged_as_probe() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(Request::get("/webhook").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_webhook_rejects_unsupported_content_type() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "text/plain")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature_when_secret_configured() {
    let mut config = test_config("https://forge.example");
    config.webhook_secret = Some("s3cr3t".to_string());
    let (state, _db) = test_state(config);

    let response = create_router(state)
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .header(SIGNATURE_HEADER, "sha256=0000")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_accepts_valid_signature_and_ignores_unknown_payload() {
    let mut config = test_config("https://forge.example");
    config.webhook_secret = Some("s3cr3t".to_string());
    let (state, _db) = test_state(config);

    let body = br#"{"zen": "keep it logically awesome"}"#;
    let response = create_router(state)
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .header(SIGNATURE_HEADER, sign("s3cr3t", body))
                .body(Body::from(&body[..]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ignored");
}

#[tokio::test]
async fn test_webhook_skips_verification_without_a_secret() {
    let (state, _db) = test_state(test_config("https://forge.example"));

    let response = create_router(state)
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_connect_requires_user_id() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(Request::get("/auth/connect").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_connect_redirects_to_the_authorize_url() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(
            Request::get("/auth/connect?user_id=u1&username=alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://forge.example/login/oauth/authorize"));
    assert!(location.contains("state="));
    assert!(location.contains("redirect_uri=https%3A%2F%2Fbridge.example%2Fauth%2Fcallback"));
}

#[tokio::test]
async fn test_auth_callback_passes_through_provider_errors() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(
            Request::get("/auth/callback?error=access_denied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_callback_requires_code_and_state() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(
            Request::get("/auth/callback?code=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_callback_rejects_unknown_state() {
    let (state, _db) = test_state(test_config("https://forge.example"));
    let response = create_router(state)
        .oneshot(
            Request::get("/auth/callback?code=abc&state=never-issued")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_authorization_flow_stores_the_credential() {
    let server = MockServer::start().await;
    Mock::given(http_method("POST"))
        .and(url_path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(http_method("GET"))
        .and(url_path("/api/v1/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": 1, "login": "alice-forge"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (state, _db) = test_state(test_config(&server.uri()));
    let router = create_router(state.clone());

    let response = router
        .clone()
        .oneshot(
            Request::get("/auth/connect?user_id=u1&username=alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    let authorize_url = url::Url::parse(location).unwrap();
    let csrf_state = authorize_url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.to_string())
        .unwrap();

    let response = router
        .oneshot(
            Request::get(format!("/auth/callback?code=the-code&state={csrf_state}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "connected");
    assert_eq!(json["forgejo_username"], "alice-forge");

    let credential = state.tokens.get("u1").unwrap().unwrap();
    assert_eq!(credential.access_token, "access-1");
    assert_eq!(credential.remote_username, "alice-forge");
}

// End-to-end: a slash command creates an issue and its thread correlation,
// and a later `closed` event for that issue produces exactly one threaded
// reply and no new top-level message.
#[tokio::test]
async fn test_slash_created_issue_receives_exactly_one_threaded_reply() {
    let server = MockServer::start().await;

    Mock::given(http_method("GET"))
        .and(url_path("/api/v1/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 5})))
        .mount(&server)
        .await;
    Mock::given(http_method("POST"))
        .and(url_path("/api/v1/repos/acme/widgets/issues"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "number": 12,
            "title": "Fix bug",
            "html_url": "https://forge.example/acme/widgets/issues/12",
            "state": "open"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Mounted first so a threaded post matches here and nowhere else.
    Mock::given(http_method("POST"))
        .and(url_path("/api/v4/posts"))
        .and(body_partial_json(serde_json::json!({"root_id": "root-1"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "reply-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The confirmation post of the slash command itself; exactly one
    // un-threaded post may ever happen.
    Mock::given(http_method("POST"))
        .and(url_path("/api/v4/posts"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "root-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.webhook_secret = Some("s3cr3t".to_string());
    config.chat_api_url = Some(server.uri());
    config.chat_api_token = Some("bot-token".to_string());
    let (state, db) = test_state(config);

    let grant = TokenGrant {
        access_token: "forge-token".to_string(),
        refresh_token: None,
        expires_in: Some(3600),
    };
    state.tokens.put("u1", "alice", &grant, "alice-forge").unwrap();

    let router = create_router(state);

    let form: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("token", "")
        .append_pair("text", "acme widgets Fix bug")
        .append_pair("user_id", "u1")
        .append_pair("user_name", "alice")
        .append_pair("channel_id", "chan-1")
        .append_pair("channel_name", "town-square")
        .append_pair("team_domain", "acme-team")
        .finish();
    let response = router
        .clone()
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Confirmation went through the chat API, so the slash response is empty.
    assert_eq!(body_json(response).await, serde_json::json!({}));

    let key = IssueKey::new("acme".to_string(), "widgets".to_string(), 12).unwrap();
    let correlation = db.correlations().get(&key).unwrap().unwrap();
    assert_eq!(correlation.root_message_id.as_deref(), Some("root-1"));

    let event = serde_json::json!({
        "action": "closed",
        "issue": {
            "number": 12,
            "title": "Fix bug",
            "html_url": "https://forge.example/acme/widgets/issues/12",
            "state": "closed"
        },
        "repository": {"name": "widgets", "owner": {"login": "acme"}},
        "sender": {"login": "bob"}
    });
    let body = serde_json::to_vec(&event).unwrap();
    let response = router
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .header(SIGNATURE_HEADER, sign("s3cr3t", &body))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "processed");

    // MockServer::drop verifies the expect(1) counts: one confirmation
    // post, one threaded reply, nothing else.
}
