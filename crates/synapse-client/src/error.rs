//! Error types for the Synapse client.
//!
//! Every HTTP failure is normalized into one [`ApiError`] carrying a message
//! fit for display. [`ChatError`] adds the local validation and concurrency
//! failures of a chat session.

use thiserror::Error;

/// Message used when neither the server nor the transport says anything useful.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Where an [`ApiError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Request never got a response (DNS, connect, timeout, broken body)
    Transport,
    /// 401 or 403
    Auth,
    /// Any other non-success status
    Server,
    /// Success status with a body that didn't match the expected shape
    Decode,
    /// Rejected locally before any request was made
    Validation,
    /// Local token storage failed
    Storage,
}

/// Normalized client error.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when a response arrived
    pub status: Option<u16>,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            kind,
            status,
            message,
        }
    }

    /// Local validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, None, message)
    }

    /// Token storage failure.
    pub fn storage(err: &synapse_core::SynapseError) -> Self {
        Self::new(ApiErrorKind::Storage, None, err.to_string())
    }

    /// Transport-level failure.
    pub fn transport(err: &reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Transport, err.status().map(|s| s.as_u16()), err.to_string())
    }

    /// Classify a non-success response.
    ///
    /// The message is the server's `message` (or `error`) field when the body
    /// is JSON carrying one, otherwise a message naming the status code.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => ApiErrorKind::Auth,
            _ => ApiErrorKind::Server,
        };
        let message = server_message(body)
            .unwrap_or_else(|| format!("Request failed with status code {status}"));
        Self::new(kind, Some(status), message)
    }

    /// Check if this is an authentication failure (401/403).
    pub fn is_auth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }

    /// Check if retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ApiErrorKind::Transport => true,
            ApiErrorKind::Server => matches!(self.status, Some(408 | 429 | 500..=599)),
            _ => false,
        }
    }
}

/// Pull a human-readable message out of a JSON error body.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|v| match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Object(inner) => inner
                .get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string),
            _ => None,
        })
}

/// Chat session errors.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Blank message content
    #[error("Message is empty")]
    EmptyMessage,

    /// Another send/edit/regenerate is in flight
    #[error("Another chat request is still in progress")]
    Busy,

    /// Operation needs an open chat
    #[error("No chat is open")]
    NoActiveChat,

    /// Missing chat identifier
    #[error("Chat id is empty")]
    MissingChatId,

    /// Message index outside the transcript
    #[error("Message index {index} is out of range (transcript has {len} messages)")]
    InvalidIndex { index: usize, len: usize },

    /// A newer open/new-chat request replaced this one
    #[error("Loading chat {0} was superseded by a newer request")]
    Superseded(String),

    /// Remote call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ChatError {
    /// Check if this failure was decided locally without a network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyMessage
                | ChatError::MissingChatId
                | ChatError::InvalidIndex { .. }
                | ChatError::NoActiveChat
        ) || matches!(self, ChatError::Api(e) if e.kind == ApiErrorKind::Validation)
    }

    /// Check if the session expired underneath this call.
    pub fn is_auth(&self) -> bool {
        matches!(self, ChatError::Api(e) if e.is_auth())
    }

    /// Check if the caller can retry as-is.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Busy => true,
            ChatError::Api(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Deep-link parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeepLinkError {
    #[error("Invalid deep link: {0}")]
    InvalidUri(String),

    #[error("Unsupported deep link scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Deep link carries neither a token nor a status")]
    MissingParameters,
}

/// Result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_preferred() {
        let err = ApiError::from_http_status(422, r#"{"message":"Title is required"}"#);
        assert_eq!(err.to_string(), "Title is required");
        assert_eq!(err.kind, ApiErrorKind::Server);
        assert_eq!(err.status, Some(422));
    }

    #[test]
    fn test_nested_and_alternate_message_fields() {
        assert_eq!(
            server_message(r#"{"error":{"message":"Quota exceeded"}}"#).as_deref(),
            Some("Quota exceeded")
        );
        assert_eq!(
            server_message(r#"{"detail":"Not found"}"#).as_deref(),
            Some("Not found")
        );
        assert_eq!(server_message(r#"{"message":"  "}"#), None);
        assert_eq!(server_message("<html>502</html>"), None);
    }

    #[test]
    fn test_status_message_without_server_message() {
        let err = ApiError::from_http_status(500, "");
        assert_eq!(err.message, "Request failed with status code 500");
        assert!(err.is_retryable());

        let err = ApiError::from_http_status(502, "<html>Bad Gateway</html>");
        assert_eq!(err.message, "Request failed with status code 502");
    }

    #[test]
    fn test_blank_message_uses_generic_fallback() {
        let err = ApiError::new(ApiErrorKind::Server, None, "  ");
        assert_eq!(err.message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_auth_classification() {
        assert!(ApiError::from_http_status(401, "{}").is_auth());
        assert!(ApiError::from_http_status(403, "{}").is_auth());
        assert!(!ApiError::from_http_status(404, "{}").is_auth());
        assert!(!ApiError::from_http_status(401, "{}").is_retryable());
    }

    #[test]
    fn test_chat_error_classification() {
        assert!(ChatError::EmptyMessage.is_validation());
        assert!(ChatError::InvalidIndex { index: 3, len: 2 }.is_validation());
        assert!(!ChatError::Busy.is_validation());
        assert!(ChatError::Busy.is_retryable());

        let auth = ChatError::from(ApiError::from_http_status(401, ""));
        assert!(auth.is_auth());
        assert!(!auth.is_retryable());
    }
}
