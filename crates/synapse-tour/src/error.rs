//! Error types for tour loading.

use std::path::PathBuf;

use thiserror::Error;

/// Tour errors.
#[derive(Debug, Error)]
pub enum TourError {
    /// Tour file could not be read
    #[error("Failed to read tour file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tour file is not valid YAML or has the wrong shape
    #[error("Invalid tour definition{}: {source}", location(.path))]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_yaml::Error,
    },

    /// Tour parsed but breaks a structural rule
    #[error("Invalid tour '{page_id}': {message}")]
    Invalid { page_id: String, message: String },

    /// No tour registered for the page
    #[error("No tour registered for page '{0}'")]
    UnknownPage(String),
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

impl TourError {
    pub fn invalid(page_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            page_id: page_id.into(),
            message: message.into(),
        }
    }
}

/// Result type for tour operations.
pub type Result<T> = std::result::Result<T, TourError>;
