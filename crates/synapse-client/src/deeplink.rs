//! Auth callback deep links.
//!
//! After an external sign-in the OS hands the mobile shell a URI such as
//! `synapse://auth/callback?token=...` or
//! `synapse://auth/callback?status=error&message=Access%20denied`.

use reqwest::Url;

use crate::error::DeepLinkError;

/// Custom URI scheme registered by the app.
pub const SCHEME: &str = "synapse";

/// What a callback link carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLink {
    /// Bearer token to resume the session with
    Token(String),
    /// Outcome without a token
    Status {
        status: String,
        message: Option<String>,
    },
}

impl DeepLink {
    /// Parse a callback URI. A token wins over a status when both are present.
    pub fn parse(uri: &str) -> Result<Self, DeepLinkError> {
        let url = Url::parse(uri.trim()).map_err(|e| DeepLinkError::InvalidUri(e.to_string()))?;
        if url.scheme() != SCHEME {
            return Err(DeepLinkError::UnsupportedScheme(url.scheme().to_string()));
        }

        let mut token = None;
        let mut status = None;
        let mut message = None;
        for (key, value) in url.query_pairs() {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "token" => token = Some(value),
                "status" => status = Some(value),
                "message" => message = Some(value),
                _ => {}
            }
        }

        match (token, status) {
            (Some(token), _) => Ok(DeepLink::Token(token)),
            (None, Some(status)) => Ok(DeepLink::Status { status, message }),
            (None, None) => Err(DeepLinkError::MissingParameters),
        }
    }

    /// Check if this link reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, DeepLink::Status { status, .. } if status.eq_ignore_ascii_case("error"))
    }
}
