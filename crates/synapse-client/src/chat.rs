//! Remote chat service.
//!
//! [`ChatService`] is the seam between [`ChatSession`] and the backend.
//! [`HttpChatService`] talks to the `/api/chats` routes through
//! [`ApiClient`]; [`MockChatService`] keeps conversations in memory for tests
//! and offline demos.
//!
//! The service is authoritative for transcripts: after an edit or a
//! regenerate it returns the full message list, including any later turns
//! it dropped.
//!
//! [`ChatSession`]: crate::session::ChatSession

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ::async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synapse_core::{ChatMessage, Role};
use tokio::time::Duration;

use crate::error::ApiError;
use crate::http::ApiClient;

/// Chat list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full conversation as stored by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Remote chat operations.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Start a new, empty chat.
    async fn create_chat(&self) -> Result<ChatSummary, ApiError>;

    /// Post a user message and return the assistant's reply.
    async fn send_message(&self, chat_id: &str, content: &str) -> Result<ChatMessage, ApiError>;

    /// Fetch a whole conversation.
    async fn get_chat(&self, chat_id: &str) -> Result<ChatTranscript, ApiError>;

    /// Replace the message at `index` and return the resulting transcript.
    async fn edit_message(
        &self,
        chat_id: &str,
        index: usize,
        content: &str,
    ) -> Result<Vec<ChatMessage>, ApiError>;

    /// Regenerate the response at `index` and return the resulting transcript.
    async fn regenerate_response(
        &self,
        chat_id: &str,
        index: usize,
    ) -> Result<Vec<ChatMessage>, ApiError>;

    /// List the user's chats, newest first.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ApiError>;

    /// Delete a chat.
    async fn delete_chat(&self, chat_id: &str) -> Result<(), ApiError>;

    /// Implementation name for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct MessagesEnvelope {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatsEnvelope {
    chats: Vec<ChatSummary>,
}

/// [`ChatService`] over the backend REST API.
#[derive(Debug, Clone)]
pub struct HttpChatService {
    client: Arc<ApiClient>,
}

impl HttpChatService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn create_chat(&self) -> Result<ChatSummary, ApiError> {
        self.client.post("/api/chats", &serde_json::json!({})).await
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<ChatMessage, ApiError> {
        let envelope: MessageEnvelope = self
            .client
            .post(&format!("/api/chats/{chat_id}/messages"), &ContentBody { content })
            .await?;
        Ok(envelope.message)
    }

    async fn get_chat(&self, chat_id: &str) -> Result<ChatTranscript, ApiError> {
        self.client.get(&format!("/api/chats/{chat_id}")).await
    }

    async fn edit_message(
        &self,
        chat_id: &str,
        index: usize,
        content: &str,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let envelope: MessagesEnvelope = self
            .client
            .put(
                &format!("/api/chats/{chat_id}/messages/{index}"),
                &ContentBody { content },
            )
            .await?;
        Ok(envelope.messages)
    }

    async fn regenerate_response(
        &self,
        chat_id: &str,
        index: usize,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let envelope: MessagesEnvelope = self
            .client
            .post(
                &format!("/api/chats/{chat_id}/messages/{index}/regenerate"),
                &serde_json::json!({}),
            )
            .await?;
        Ok(envelope.messages)
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ApiError> {
        let envelope: ChatsEnvelope = self.client.get("/api/chats").await?;
        Ok(envelope.chats)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value>(&format!("/api/chats/{chat_id}"))
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// In-memory [`ChatService`].
///
/// Replies echo the user's message. Edits and regenerations drop every turn
/// after the affected message, the way the real service does.
#[derive(Debug, Default)]
pub struct MockChatService {
    chats: Mutex<HashMap<String, Vec<ChatMessage>>>,
    next_id: AtomicUsize,
    calls: AtomicUsize,
    fail_next: Mutex<Option<ApiError>>,
    reply_delay: Mutex<Duration>,
    load_delays: Mutex<HashMap<String, Duration>>,
}

impl MockChatService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a conversation.
    pub fn with_chat(self, chat_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        self.lock_chats().insert(chat_id.into(), messages);
        self
    }

    /// Delay every send, edit and regenerate.
    pub fn with_reply_delay(self, delay: Duration) -> Self {
        *self.reply_delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
        self
    }

    /// Delay loading one particular chat.
    pub fn with_load_delay(self, chat_id: impl Into<String>, delay: Duration) -> Self {
        self.load_delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat_id.into(), delay);
        self
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        *self.fail_next.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Number of calls received, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stored transcript of a chat.
    pub fn transcript(&self, chat_id: &str) -> Option<Vec<ChatMessage>> {
        self.lock_chats().get(chat_id).cloned()
    }

    fn lock_chats(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<ChatMessage>>> {
        self.chats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, delay: Duration) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.fail_next.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn reply_delay(&self) -> Duration {
        *self.reply_delay.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_found(chat_id: &str) -> ApiError {
        ApiError::from_http_status(404, &format!(r#"{{"message":"Chat {chat_id} not found"}}"#))
    }

    fn reply_to(content: &str) -> ChatMessage {
        let mut reply = ChatMessage::assistant(format!("Echo: {content}"));
        reply.timestamp = Some(Utc::now());
        reply
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn create_chat(&self) -> Result<ChatSummary, ApiError> {
        self.enter(Duration::ZERO).await?;
        let id = format!("chat-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.lock_chats().insert(id.clone(), Vec::new());
        Ok(ChatSummary {
            id,
            title: None,
            updated_at: Some(Utc::now()),
        })
    }

    async fn send_message(&self, chat_id: &str, content: &str) -> Result<ChatMessage, ApiError> {
        self.enter(self.reply_delay()).await?;
        let mut chats = self.lock_chats();
        let messages = chats.get_mut(chat_id).ok_or_else(|| Self::not_found(chat_id))?;
        let reply = Self::reply_to(content);
        messages.push(ChatMessage::user(content));
        messages.push(reply.clone());
        Ok(reply)
    }

    async fn get_chat(&self, chat_id: &str) -> Result<ChatTranscript, ApiError> {
        let delay = self
            .load_delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(chat_id)
            .copied()
            .unwrap_or_default();
        self.enter(delay).await?;

        let chats = self.lock_chats();
        let messages = chats.get(chat_id).ok_or_else(|| Self::not_found(chat_id))?;
        Ok(ChatTranscript {
            id: chat_id.to_string(),
            title: messages.first().map(|m| m.content.chars().take(40).collect()),
            messages: messages.clone(),
        })
    }

    async fn edit_message(
        &self,
        chat_id: &str,
        index: usize,
        content: &str,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        self.enter(self.reply_delay()).await?;
        let mut chats = self.lock_chats();
        let messages = chats.get_mut(chat_id).ok_or_else(|| Self::not_found(chat_id))?;
        if index >= messages.len() {
            return Err(ApiError::from_http_status(400, r#"{"message":"Invalid message index"}"#));
        }

        messages.truncate(index + 1);
        messages[index].content = content.to_string();
        if messages[index].role == Role::User {
            messages.push(Self::reply_to(content));
        }
        Ok(messages.clone())
    }

    async fn regenerate_response(
        &self,
        chat_id: &str,
        index: usize,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        self.enter(self.reply_delay()).await?;
        let mut chats = self.lock_chats();
        let messages = chats.get_mut(chat_id).ok_or_else(|| Self::not_found(chat_id))?;
        if index >= messages.len() || messages[index].role != Role::Assistant {
            return Err(ApiError::from_http_status(
                400,
                r#"{"message":"Only assistant responses can be regenerated"}"#,
            ));
        }

        let prompt = messages[..index]
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        messages.truncate(index);
        let mut reply = Self::reply_to(&prompt);
        reply.content.push_str(" (regenerated)");
        messages.push(reply);
        Ok(messages.clone())
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ApiError> {
        self.enter(Duration::ZERO).await?;
        let mut chats: Vec<ChatSummary> = self
            .lock_chats()
            .keys()
            .map(|id| ChatSummary {
                id: id.clone(),
                title: None,
                updated_at: None,
            })
            .collect();
        chats.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(chats)
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<(), ApiError> {
        self.enter(Duration::ZERO).await?;
        self.lock_chats()
            .remove(chat_id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(chat_id))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
