//! Error types for bandmeta.
//!
//! Library crates use [`BandMetaError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all bandmeta operations.
#[derive(Debug, thiserror::Error)]
pub enum BandMetaError {
    /// Invalid input, e.g. an empty band identifier.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The overview page for the band does not exist.
    #[error("band not found: {band}")]
    NotFound { band: String },

    /// Any other non-success HTTP status.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// Request construction, network, or deadline failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The token stream failed before a clean end-of-stream.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Configuration loading error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A collector worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BandMetaError>;

impl BandMetaError {
    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the distinguished "band not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
