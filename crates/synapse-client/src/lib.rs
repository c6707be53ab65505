//! # synapse-client
//!
//! Network-facing half of the Synapse client core.
//!
//! This crate provides:
//! - [`ApiClient`] - HTTP client that attaches the bearer token and turns
//!   401/403 responses into a single re-authentication prompt
//! - [`AuthPromptGuard`] - Cooldown keeping concurrent failures to one prompt
//! - [`AuthApi`] - Login, logout and current-user calls
//! - [`ChatService`] - Seam to the remote chat service, with
//!   [`HttpChatService`] and [`MockChatService`] implementations
//! - [`ChatSession`] - Transcript state with optimistic send and rollback
//! - [`deeplink`] - Parsing of the mobile auth callback URI
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use synapse_client::{ApiClient, ChatSession, HttpChatService};
//! use synapse_config::SynapseConfig;
//! use synapse_core::{EventBus, TokenStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SynapseConfig::load(None)?;
//! let bus = Arc::new(EventBus::new());
//! let client = Arc::new(ApiClient::from_config(&config, TokenStore::in_memory(), bus)?);
//!
//! let session = ChatSession::new(Arc::new(HttpChatService::new(client)));
//! let reply = session.send_message("Explain photosynthesis").await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod auth_guard;
pub mod chat;
pub mod deeplink;
pub mod error;
pub mod http;
pub mod session;

// Re-export main types
pub use auth::{AuthApi, User};
pub use auth_guard::AuthPromptGuard;
pub use chat::{ChatService, ChatSummary, ChatTranscript, HttpChatService, MockChatService};
pub use deeplink::DeepLink;
pub use error::{ApiError, ApiErrorKind, ChatError, DeepLinkError, Result};
pub use http::{ApiClient, RequestOptions};
pub use session::{ChatSession, PendingAppend, Transcript};
