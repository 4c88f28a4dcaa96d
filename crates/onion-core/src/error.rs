//! Error types for event logging and aggregation

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing tracking files
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of a record or document failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of a JSON Lines file could not be parsed
    #[error("Malformed record at {}:{line}: {source}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The stats document exists but is not valid
    #[error("Malformed stats document {}: {source}", path.display())]
    MalformedStats {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record was expected to be a JSON object
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl TrackingError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Name of the JSON type of `value`, for error messages
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
