//! Logging infrastructure for Synapse.
//!
//! Structured logging using the `tracing` ecosystem. The client writes its
//! own JSON-lines log file next to its storage so session-expiry and chat
//! failures can be inspected after the fact.
//!
//! ## Features
//!
//! - JSON lines format for machine parsing
//! - File output to `~/.synapse/logs/synapse.log` (rolled daily)
//! - Console output with configurable verbosity
//!
//! ## Example
//!
//! ```no_run
//! use synapse_core::logging;
//!
//! // Initialize logging (call once at startup)
//! let _guard = logging::init_logging(None, false).expect("logging init");
//!
//! tracing::info!("synapse started");
//! tracing::debug!(chat_id = "c-42", "opening chat");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{Result, SynapseError};

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the Synapse logging system.
///
/// This sets up:
/// - File logging to `~/.synapse/logs/synapse.log` (JSON lines format)
/// - Console logging to stderr (human-readable format)
///
/// `RUST_LOG` overrides the level; otherwise `verbose` selects DEBUG over INFO.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| SynapseError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "synapse.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("synapse={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| SynapseError::internal(format!("failed to install tracing subscriber: {e}")))?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Root directory for Synapse client state.
///
/// Returns `~/.synapse/`
pub fn synapse_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| SynapseError::Internal {
        message: "could not determine home directory".into(),
    })?;

    Ok(home.join(".synapse"))
}

/// Get the default log directory path.
///
/// Returns `~/.synapse/logs/`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(synapse_dir()?.join("logs"))
}

/// Get the default Synapse log file path.
pub fn default_log_file() -> Result<PathBuf> {
    Ok(default_log_dir()?.join("synapse.log"))
}
