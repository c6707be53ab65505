//! Error types for Synapse core operations.
//!
//! This module defines [`SynapseError`], the error enum shared by storage,
//! configuration and logging setup. Network and chat failures have their own
//! types in `synapse-client`; everything here is local to the device.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SynapseError`].
pub type Result<T> = std::result::Result<T, SynapseError>;

/// Error type for local Synapse operations.
///
/// None of these are fatal to the host application: a failed read of the
/// store or config falls back to defaults at the call site, and the user can
/// retry anything else.
#[derive(Debug, Error)]
pub enum SynapseError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Parsing Errors
    // =========================================================================
    /// JSON parsing error
    #[error("JSON parse error in {context}: {message}")]
    JsonParse {
        context: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Unrecognized value for an enumerated setting
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SynapseError {
    // =========================================================================
    // Constructor helpers for common error patterns
    // =========================================================================

    /// Create a ConfigNotFound error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a ConfigNotFound error with source
    pub fn config_not_found_with_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: Some(source),
        }
    }

    /// Create a ConfigValidation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parse error
    pub fn json_parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonParse {
            context: context.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Error classification helpers
    // =========================================================================

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns true if this error came from the filesystem
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::DirectoryCreation { .. })
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create ~/.synapse/config.yaml or pass --config with an existing file")
            }
            Self::ConfigInvalid { .. } => Some("Check YAML syntax in the configuration file"),
            Self::ConfigValidation { .. } => {
                Some("Check api.base_url and api.timeout_secs in the configuration file")
            }
            Self::JsonParse { .. } => {
                Some("The local store may be corrupted; remove ~/.synapse/storage.json to reset it")
            }
            Self::InvalidValue { .. } => Some("Run with --help to see accepted values"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_error() {
        let err = SynapseError::config_not_found("/home/user/.synapse/config.yaml");
        assert!(err.to_string().contains("Configuration not found"));
        assert!(err.is_config_error());
        assert!(err.guidance().is_some());
    }

    #[test]
    fn test_io_error_classification() {
        let err = SynapseError::io(
            "writing",
            "/tmp/storage.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_io_error());
        assert!(!err.is_config_error());
        assert!(err.to_string().contains("/tmp/storage.json"));
    }

    #[test]
    fn test_invalid_value_guidance() {
        let err = SynapseError::invalid_value("theme", "sepia");
        assert_eq!(err.to_string(), "Invalid value for theme: sepia");
        assert_eq!(err.guidance(), Some("Run with --help to see accepted values"));
    }
}
