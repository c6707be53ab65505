//! # synapse-core
//!
//! Core types, errors, and client-side state shared by every Synapse front-end.
//!
//! This crate provides:
//! - [`SynapseError`] - Error type for storage, configuration and parsing
//! - [`logging`] - Tracing setup and log file locations
//! - [`types`] - Toasts, chat messages and attachments
//! - [`bus`] - The UI event bus connecting non-UI code to notification renderers
//! - [`toast`] - Toast list and auth-modal state fed by the bus
//! - [`storage`] - Persistent key/value storage for the bearer token and theme
//! - [`theme`] - Theme preference context
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use synapse_core::{EventBus, ToastCenter, ToastRequest, bus::TOAST_EVENT};
//!
//! let bus = Arc::new(EventBus::new());
//! let toasts = ToastCenter::attach(&bus);
//!
//! bus.publish(TOAST_EVENT, &ToastRequest::warning("Session expired").into());
//! assert_eq!(toasts.active().len(), 1);
//! ```

pub mod bus;
pub mod error;
pub mod logging;
pub mod storage;
pub mod theme;
pub mod toast;
pub mod types;

// Re-export main types for convenience
pub use bus::{Callback, EventBus, EventPayload, Subscription};
pub use error::{Result, SynapseError};
pub use logging::{LogGuard, init_logging};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TokenStore};
pub use theme::{Appearance, ThemeContext, ThemePreference};
pub use toast::{AuthModalState, Toast, ToastCenter};
pub use types::{Attachment, AttachmentKind, ChatMessage, Role, Severity, ToastRequest};
