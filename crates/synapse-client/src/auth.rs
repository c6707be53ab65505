//! Sign-in and session calls.
//!
//! Login is the only writer of the stored bearer token; logout and the
//! interceptor's session-expiry handling clear it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::deeplink::DeepLink;
use crate::error::ApiError;
use crate::http::{ApiClient, RequestOptions};

/// Signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    user: Option<User>,
}

/// Auth endpoints on top of [`ApiClient`].
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Exchange credentials for a bearer token and store it.
    ///
    /// A 401 here means bad credentials, so it does not trigger the
    /// session-expired prompt.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }

        let response: LoginResponse = self
            .client
            .post_with(
                "/api/auth/login",
                &LoginRequest {
                    email: email.trim(),
                    password,
                },
                RequestOptions::quiet(),
            )
            .await?;

        self.store_token(&response.token)?;
        info!(email = email.trim(), "signed in");
        Ok(response.user)
    }

    /// Clear the stored token and tell the backend, best effort.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let server_result = self
            .client
            .post_with::<_, serde_json::Value>(
                "/api/auth/logout",
                &serde_json::json!({}),
                RequestOptions::quiet(),
            )
            .await;
        if let Err(e) = &server_result {
            warn!(error = %e, "server-side logout failed, clearing local session anyway");
        }

        self.client
            .tokens()
            .clear()
            .map_err(|e| ApiError::storage(&e))?;
        info!("signed out");
        Ok(())
    }

    /// Fetch the signed-in user.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get("/api/auth/me").await
    }

    /// Check if a token is stored. Says nothing about whether it's still valid.
    pub fn is_signed_in(&self) -> bool {
        matches!(self.client.tokens().get(), Ok(Some(_)))
    }

    /// Store a token obtained outside the login call (deep link, OAuth bridge).
    pub fn store_token(&self, token: &str) -> Result<(), ApiError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::validation("Token is empty"));
        }
        self.client
            .tokens()
            .set(token)
            .map_err(|e| ApiError::storage(&e))?;
        self.client.auth_guard().reset();
        Ok(())
    }

    /// Resume the session a deep link carries.
    ///
    /// Returns true when a token was stored.
    pub fn apply_deep_link(&self, link: &DeepLink) -> Result<bool, ApiError> {
        match link {
            DeepLink::Token(token) => {
                self.store_token(token)?;
                info!("session resumed from deep link");
                Ok(true)
            }
            DeepLink::Status { status, message } => {
                info!(%status, message = message.as_deref().unwrap_or(""), "deep link status");
                Ok(false)
            }
        }
    }
}
