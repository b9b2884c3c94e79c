//! Error types for gradesync.
//!
//! Library crates use [`GradesyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all gradesync operations.
#[derive(Debug, thiserror::Error)]
pub enum GradesyncError {
    /// Login failure: invalid credentials, unexpected redirect, or a login
    /// page without a security token.
    #[error("auth error: {message}")]
    Auth { message: String },

    /// Network/HTTP error while talking to Gradescope.
    #[error("network error: {0}")]
    Network(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Google Calendar API error.
    #[error("calendar error: {0}")]
    Calendar(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GradesyncError>;

impl GradesyncError {
    /// Create an auth error from any displayable message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth {
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
}
