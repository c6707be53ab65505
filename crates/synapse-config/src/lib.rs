//! # synapse-config
//!
//! Configuration for the Synapse client, read from `~/.synapse/config.yaml`.
//!
//! ```yaml
//! api:
//!   base_url: https://api.synapse.example
//!   timeout_secs: 30
//! auth:
//!   prompt_cooldown_secs: 10
//!   expired_message: Your session has expired. Please sign in again.
//!   toast_duration_ms: 5000
//! storage:
//!   path: /home/me/.synapse/storage.json
//! log_dir: /home/me/.synapse/logs
//! ```
//!
//! Every field has a default, so an empty or missing file is valid.
//! `SYNAPSE_API_URL` overrides `api.base_url`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use synapse_core::{Result, SynapseError, logging::synapse_dir};
use tracing::debug;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "SYNAPSE_API_URL";

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynapseConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    /// Log directory (defaults to `~/.synapse/logs`)
    pub log_dir: Option<PathBuf>,
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Session-expiry handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Minimum seconds between two re-authentication prompts
    pub prompt_cooldown_secs: u64,
    /// Toast text shown when the session expires
    pub expired_message: String,
    /// How long the expiry toast stays visible
    pub toast_duration_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            prompt_cooldown_secs: 10,
            expired_message: "Your session has expired. Please sign in again.".to_string(),
            toast_duration_ms: 5000,
        }
    }
}

impl AuthConfig {
    pub fn prompt_cooldown(&self) -> Duration {
        Duration::from_secs(self.prompt_cooldown_secs)
    }
}

/// Local storage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage file (defaults to `~/.synapse/storage.json`)
    pub path: Option<PathBuf>,
}

impl SynapseConfig {
    /// Default config file path: `~/.synapse/config.yaml`.
    pub fn default_path() -> Result<PathBuf> {
        Ok(synapse_dir()?.join("config.yaml"))
    }

    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one, a missing
    /// `~/.synapse/config.yaml` yields defaults. Env overrides are applied and
    /// the result is validated in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without env overrides or validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SynapseError::config_not_found_with_source(path, e))?;
        Self::from_yaml(&content, path)
    }

    fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| SynapseError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            debug!(url = %url, "api base url overridden from environment");
            self.api.base_url = url;
        }
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(SynapseError::config_validation("api.base_url must not be empty"));
        }
        let parsed = reqwest::Url::parse(url).map_err(|e| {
            SynapseError::config_validation(format!("api.base_url is not a valid URL: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SynapseError::config_validation(format!(
                "api.base_url must use http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(SynapseError::config_validation("api.timeout_secs must be greater than 0"));
        }
        Ok(())
    }

    /// Storage file, resolving the default.
    pub fn storage_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => Ok(synapse_dir()?.join("storage.json")),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
