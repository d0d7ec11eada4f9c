//! Error types for the WIS 2.0 notification publisher
//!
//! Every failure that can end an invocation is a [`PublishError`]. Layer
//! specific errors ([`ConfigError`](crate::config::ConfigError) and
//! [`MqttError`](crate::transport::mqtt::MqttError)) convert into it with `?`.
//! Nothing here is retried: each variant is fatal to the current run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for notification building and publishing
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O error during {operation} of {}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checksum failed for {}", path.display())]
    Checksum {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Encoding failed during {operation}")]
    Encoding {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot merge properties: {message}")]
    Merge { message: String },

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Transport(#[from] crate::transport::mqtt::MqttError),

    #[error("Operation cancelled during {operation}")]
    Cancelled { operation: &'static str },
}

impl PublishError {
    /// Create I/O error for an operation on a path
    pub fn io<P: Into<PathBuf>>(operation: &'static str, path: P, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Create checksum error
    pub fn checksum<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Checksum {
            path: path.into(),
            source,
        }
    }

    /// Create validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create encoding error
    pub fn encoding(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Encoding { operation, source }
    }

    /// Create property merge error
    pub fn merge<S: Into<String>>(message: S) -> Self {
        Self::Merge {
            message: message.into(),
        }
    }

    /// Create cancellation error
    pub fn cancelled(operation: &'static str) -> Self {
        Self::Cancelled { operation }
    }

    /// Whether this error came from the cancellation token rather than a real failure
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PublishError::Cancelled { .. }
                | PublishError::Transport(crate::transport::mqtt::MqttError::Cancelled { .. })
        )
    }
}

/// Render an error with its full `source()` chain, `outer: inner: root`
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}

/// Result type for publisher operations
pub type PublishResult<T> = Result<T, PublishError>;
