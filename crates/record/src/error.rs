//! Error types for the gabor-record crate.

use std::path::PathBuf;

/// Error type for all fallible operations in the gabor-record crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecordError {
    /// Returned when a named value does not exist in the current group.
    #[error("key '{name}' not found")]
    MissingKey {
        /// Name of the missing value.
        name: String,
    },

    /// Returned when a group does not exist.
    #[error("group '{name}' not found")]
    MissingGroup {
        /// Name of the missing group.
        name: String,
    },

    /// Returned when a name is empty or contains a path separator.
    #[error("invalid record name '{name}'")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// Returned when a stored value has a different kind than requested.
    #[error("key '{name}' holds {found}, expected {expected}")]
    TypeMismatch {
        /// Name of the value.
        name: String,
        /// Requested kind.
        expected: &'static str,
        /// Stored kind.
        found: &'static str,
    },

    /// Returned when a stored array has an unexpected rank or inconsistent shape.
    #[error("key '{name}' has shape {shape:?}, expected rank {rank}")]
    ShapeMismatch {
        /// Name of the value.
        name: String,
        /// Requested rank.
        rank: usize,
        /// Stored shape.
        shape: Vec<usize>,
    },

    /// Wraps a JSON (de)serialisation failure.
    #[error("json error: {reason}")]
    Json {
        /// Description of the underlying failure.
        reason: String,
    },

    /// Wraps a file-system failure.
    #[error("i/o error on {}: {reason}", path.display())]
    Io {
        /// Path that was accessed.
        path: PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Json {
            reason: e.to_string(),
        }
    }
}
