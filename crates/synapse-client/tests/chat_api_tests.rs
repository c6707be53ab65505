//! Integration tests for the HTTP chat service and the session on top of it.

use std::sync::Arc;

use serde_json::json;
use synapse_client::{ApiClient, ChatError, ChatService, ChatSession, HttpChatService};
use synapse_core::{EventBus, Role, TokenStore};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

async fn service() -> (MockServer, HttpChatService) {
    let server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set("tok").unwrap();
    let client = ApiClient::new(server.uri(), tokens, Arc::new(EventBus::new())).unwrap();
    (server, HttpChatService::new(Arc::new(client)))
}

#[tokio::test]
async fn test_send_creates_chat_then_posts_message() {
    let (server, service) = service().await;

    Mock::given(method("POST"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "c42",
            "title": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chats/c42/messages"))
        .and(body_json(json!({ "content": "What is a cell?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "A cell is the basic unit of life.",
                "timestamp": "2026-01-05T10:00:00Z",
                "attachments": [
                    { "type": "flashcard", "data": { "front": "Cell", "back": "Unit of life" } }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = ChatSession::new(Arc::new(service));
    let reply = session.send_message("What is a cell?").await.unwrap();

    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.attachments.len(), 1);
    assert_eq!(session.chat_id().as_deref(), Some("c42"));
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test]
async fn test_server_error_rolls_back_send() {
    let (server, service) = service().await;

    Mock::given(method("GET"))
        .and(path("/api/chats/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "title": "Biology",
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chats/c1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "Model overloaded" }
        })))
        .mount(&server)
        .await;

    let session = ChatSession::new(Arc::new(service));
    session.open_chat("c1").await.unwrap();
    assert_eq!(session.title().as_deref(), Some("Biology"));

    let err = session.send_message("next").await.unwrap_err();
    assert!(matches!(&err, ChatError::Api(e) if e.status == Some(500)));
    assert_eq!(err.to_string(), "Model overloaded");
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test]
async fn test_edit_uses_server_transcript() {
    let (server, service) = service().await;

    Mock::given(method("GET"))
        .and(path("/api/chats/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "messages": [
                { "role": "user", "content": "a" },
                { "role": "assistant", "content": "b" },
                { "role": "user", "content": "c" },
                { "role": "assistant", "content": "d" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/chats/c1/messages/0"))
        .and(body_json(json!({ "content": "a2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                { "role": "user", "content": "a2" },
                { "role": "assistant", "content": "b2" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = ChatSession::new(Arc::new(service));
    session.open_chat("c1").await.unwrap();
    let messages = session.edit_message(0, "a2").await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(session.messages()[1].content, "b2");
}

#[tokio::test]
async fn test_regenerate_route() {
    let (server, service) = service().await;

    Mock::given(method("POST"))
        .and(path("/api/chats/c1/messages/1/regenerate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                { "role": "user", "content": "a" },
                { "role": "assistant", "content": "fresh" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = service.regenerate_response("c1", 1).await.unwrap();
    assert_eq!(messages[1].content, "fresh");
}

#[tokio::test]
async fn test_list_and_delete_routes() {
    let (server, service) = service().await;

    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chats": [
                { "id": "c2", "title": "Chemistry", "updated_at": "2026-02-01T08:30:00Z" },
                { "id": "c1", "title": null }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/chats/c2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let chats = service.list_chats().await.unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].title.as_deref(), Some("Chemistry"));
    assert!(chats[0].updated_at.is_some());
    assert!(chats[1].title.is_none());

    service.delete_chat("c2").await.unwrap();
}
