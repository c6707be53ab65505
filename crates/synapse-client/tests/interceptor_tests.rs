//! Integration tests for the authenticated HTTP client.
//!
//! These tests verify that [`ApiClient`]:
//! 1. Attaches the stored bearer token, and only when one exists
//! 2. Clears the token on 401/403 and prompts at most once per cooldown
//! 3. Leaves login failures alone
//! 4. Normalizes error messages

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use synapse_client::{ApiClient, ApiErrorKind, AuthApi};
use synapse_core::{AuthModalState, EventBus, Severity, ToastCenter, TokenStore};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

struct Harness {
    server: MockServer,
    client: Arc<ApiClient>,
    toasts: Arc<ToastCenter>,
    modal: Arc<AuthModalState>,
}

async fn harness() -> Harness {
    harness_with_cooldown(None).await
}

async fn harness_with_cooldown(cooldown: Option<Duration>) -> Harness {
    synapse_core::logging::init_test_logging();
    let server = MockServer::start().await;
    let bus = Arc::new(EventBus::new());
    let toasts = ToastCenter::attach(&bus);
    let modal = AuthModalState::attach(&bus);

    let mut client = ApiClient::new(server.uri(), TokenStore::in_memory(), bus).unwrap();
    if let Some(cooldown) = cooldown {
        client = client.with_prompt_cooldown(cooldown);
    }

    Harness {
        server,
        client: Arc::new(client),
        toasts,
        modal,
    }
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let h = harness().await;
    h.client.tokens().set("tok-123").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u1",
            "email": "ada@example.com",
            "name": "Ada"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = AuthApi::new(h.client.clone()).current_user().await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_no_token_sends_unauthenticated() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "chats": [] })))
        .mount(&h.server)
        .await;

    let _: Value = h.client.get("/api/chats").await.unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_two_unauthorized_responses_prompt_once() {
    let h = harness().await;
    h.client.tokens().set("stale").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Token expired"
        })))
        .expect(2)
        .mount(&h.server)
        .await;

    let first = h.client.get::<Value>("/api/chats").await.unwrap_err();
    let second = h.client.get::<Value>("/api/chats").await.unwrap_err();

    assert!(first.is_auth());
    assert!(second.is_auth());
    assert_eq!(first.message, "Token expired");

    let active = h.toasts.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].severity, Severity::Warning);
    assert_eq!(active[0].message, "Your session has expired. Please sign in again.");
    assert_eq!(active[0].duration_ms, 5000);
    assert_eq!(h.modal.total_requests(), 1);

    assert_eq!(h.client.tokens().get().unwrap(), None);
}

#[tokio::test]
async fn test_concurrent_unauthorized_responses_prompt_once() {
    let h = harness().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&h.server)
        .await;

    let (a, b, c) = tokio::join!(
        h.client.get::<Value>("/api/chats"),
        h.client.get::<Value>("/api/auth/me"),
        h.client.get::<Value>("/api/chats/c1"),
    );
    assert!(a.is_err() && b.is_err() && c.is_err());

    assert_eq!(h.toasts.active().len(), 1);
    assert_eq!(h.modal.total_requests(), 1);
    assert!(h.modal.take_request());
    assert!(!h.modal.is_requested());
}

#[tokio::test]
async fn test_prompt_repeats_after_cooldown() {
    let h = harness_with_cooldown(Some(Duration::from_millis(100))).await;

    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let _ = h.client.get::<Value>("/api/chats").await;
    let _ = h.client.get::<Value>("/api/chats").await;
    assert_eq!(h.modal.total_requests(), 1);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let _ = h.client.get::<Value>("/api/chats").await;
    assert_eq!(h.modal.total_requests(), 2);
    assert_eq!(h.toasts.active().len(), 2);
}

#[tokio::test]
async fn test_failed_login_does_not_prompt() {
    let h = harness().await;
    h.client.tokens().set("keep-me").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Invalid email or password"
        })))
        .mount(&h.server)
        .await;

    let err = AuthApi::new(h.client.clone())
        .login("ada@example.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Auth);
    assert_eq!(err.message, "Invalid email or password");
    assert!(h.toasts.active().is_empty());
    assert_eq!(h.modal.total_requests(), 0);
    assert_eq!(h.client.tokens().get().unwrap().as_deref(), Some("keep-me"));
}

#[tokio::test]
async fn test_login_stores_token() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh",
            "user": { "id": "u1", "email": "ada@example.com" }
        })))
        .mount(&h.server)
        .await;

    let auth = AuthApi::new(h.client.clone());
    let user = auth.login("ada@example.com", "secret").await.unwrap();

    assert_eq!(user.map(|u| u.id).as_deref(), Some("u1"));
    assert!(auth.is_signed_in());
    assert_eq!(h.client.tokens().get().unwrap().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_logout_clears_token_even_when_server_fails() {
    let h = harness().await;
    h.client.tokens().set("tok").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let auth = AuthApi::new(h.client.clone());
    auth.logout().await.unwrap();
    assert!(!auth.is_signed_in());
}

#[tokio::test]
async fn test_error_message_normalization() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/with-message"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Title is required"
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&h.server)
        .await;

    let err = h.client.get::<Value>("/with-message").await.unwrap_err();
    assert_eq!(err.to_string(), "Title is required");
    assert_eq!(err.status, Some(422));
    assert!(!err.is_retryable());

    let err = h.client.get::<Value>("/plain").await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status code 502");
    assert_eq!(err.kind, ApiErrorKind::Server);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_transport_error_is_normalized() {
    let bus = Arc::new(EventBus::new());
    let toasts = ToastCenter::attach(&bus);
    // Nothing listens on the discard port
    let client = ApiClient::new("http://127.0.0.1:9", TokenStore::in_memory(), bus).unwrap();

    let err = client.get::<Value>("/api/chats").await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Transport);
    assert!(!err.message.is_empty());
    assert!(err.is_retryable());
    assert!(toasts.active().is_empty());
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&h.server)
        .await;

    let err = AuthApi::new(h.client.clone()).current_user().await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Decode);
    assert_eq!(err.status, Some(200));
}
