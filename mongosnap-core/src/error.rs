//! Error types for snapshot operations

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Initial connect or ping failed
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Directory or file operation failed
    #[error("IO error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A document could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    /// A line could not be deserialized into a document
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Requested snapshot does not exist
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    /// A list/find/delete/insert call against the store failed
    #[error("Failed to {operation}: {message}")]
    StoreOperation { operation: String, message: String },

    /// The operation deadline elapsed
    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl SnapshotError {
    /// Build a closure mapping an `io::Error` into [`SnapshotError::Io`]
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    /// Build a closure mapping any displayable store error into
    /// [`SnapshotError::StoreOperation`]
    pub fn store<E: std::fmt::Display>(operation: impl Into<String>) -> impl FnOnce(E) -> Self {
        let operation = operation.into();
        move |e| Self::StoreOperation {
            operation,
            message: e.to_string(),
        }
    }
}
