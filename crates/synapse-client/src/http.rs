//! HTTP client for the Synapse backend.
//!
//! [`ApiClient`] wraps `reqwest` with the two cross-cutting behaviors every
//! call site relies on:
//!
//! - **Request phase**: the stored bearer token, if any, is attached as an
//!   `Authorization` header.
//! - **Error phase**: a 401/403 clears the stored token and, at most once per
//!   cooldown window, publishes a warning toast and an `open-auth-modal`
//!   event on the UI bus. Every failure comes back to the caller as a
//!   normalized [`ApiError`].

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use synapse_config::SynapseConfig;
use synapse_core::bus::{OPEN_AUTH_MODAL_EVENT, TOAST_EVENT};
use synapse_core::{EventBus, EventPayload, SynapseError, ToastRequest, TokenStore};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::auth_guard::AuthPromptGuard;
use crate::error::{ApiError, ApiErrorKind};

/// Per-request switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Treat 401/403 as an ordinary error: keep the token, don't prompt.
    ///
    /// Used by the login call, where 401 means wrong credentials.
    pub suppress_auth_prompt: bool,
}

impl RequestOptions {
    /// Options for calls whose auth failures must not trigger the prompt.
    pub fn quiet() -> Self {
        Self {
            suppress_auth_prompt: true,
        }
    }
}

/// Authenticated JSON client.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    bus: Arc<EventBus>,
    auth_guard: AuthPromptGuard,
    expired_toast: ToastRequest,
}

impl ApiClient {
    /// Create a client from config.
    pub fn from_config(
        config: &SynapseConfig,
        tokens: TokenStore,
        bus: Arc<EventBus>,
    ) -> synapse_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SynapseError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            tokens,
            bus,
            auth_guard: AuthPromptGuard::new(config.auth.prompt_cooldown()),
            expired_toast: ToastRequest::warning(config.auth.expired_message.clone())
                .with_duration_ms(config.auth.toast_duration_ms),
        })
    }

    /// Create a client for `base_url` with default settings.
    pub fn new(
        base_url: impl Into<String>,
        tokens: TokenStore,
        bus: Arc<EventBus>,
    ) -> synapse_core::Result<Self> {
        let mut config = SynapseConfig::default();
        config.api.base_url = base_url.into();
        Self::from_config(&config, tokens, bus)
    }

    /// Replace the prompt cooldown.
    pub fn with_prompt_cooldown(mut self, cooldown: Duration) -> Self {
        self.auth_guard = AuthPromptGuard::new(cooldown);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn auth_guard(&self) -> &AuthPromptGuard {
        &self.auth_guard
    }

    /// GET `path` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::GET, path, None, RequestOptions::default())
            .await
    }

    /// POST `body` as JSON to `path`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body), RequestOptions::default())
            .await
    }

    /// POST with explicit options.
    pub async fn post_with<B, T>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body), options).await
    }

    /// PUT `body` as JSON to `path`.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(body), RequestOptions::default())
            .await
    }

    /// DELETE `path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<(), T>(Method::DELETE, path, None, RequestOptions::default())
            .await
    }

    /// Send a request through the interceptor.
    ///
    /// An empty success body decodes as JSON `null`, so `T = ()` works for
    /// endpoints that return nothing.
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut builder = self.client.request(method.clone(), &url);

        let token = self.current_token();
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(%method, path, authenticated = token.is_some(), "sending request");

        let response = builder.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "request failed before a response arrived");
            ApiError::transport(&e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::transport(&e))?;

        if !status.is_success() {
            let err = ApiError::from_http_status(status.as_u16(), &text);
            debug!(%method, path, status = status.as_u16(), message = %err.message, "request rejected");
            if err.is_auth() && !options.suppress_auth_prompt {
                self.handle_auth_failure(status.as_u16());
            }
            return Err(err);
        }

        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            warn!(%method, path, error = %e, "unexpected response body");
            ApiError::new(
                ApiErrorKind::Decode,
                Some(status.as_u16()),
                format!("Unexpected response from server: {e}"),
            )
        })
    }

    /// Session expired: drop the token and prompt, at most once per cooldown.
    fn handle_auth_failure(&self, status: u16) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to clear stored token");
        }

        if !self.auth_guard.should_prompt() {
            debug!(status, "auth prompt suppressed by cooldown");
            return;
        }

        info!(status, "session expired, prompting for sign-in");
        self.bus
            .publish(TOAST_EVENT, &EventPayload::Toast(self.expired_toast.clone()));
        self.bus.publish(OPEN_AUTH_MODAL_EVENT, &EventPayload::Empty);
    }

    fn current_token(&self) -> Option<String> {
        self.tokens.get().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read stored token, sending unauthenticated");
            None
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("auth_guard", &self.auth_guard)
            .finish_non_exhaustive()
    }
}
