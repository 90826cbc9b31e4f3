//! Error types for mimegen.
//!
//! Library crates use [`MimegenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all mimegen build operations.
#[derive(Debug, thiserror::Error)]
pub enum MimegenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a source or detail page.
    #[error("network error: {0}")]
    Network(String),

    /// Registry document or override file parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Detail-page enrichment error (worker pool or task failure).
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad table file, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Artifact emission error.
    #[error("emit error: {0}")]
    Emit(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MimegenError>;

impl MimegenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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
}
