//! Error types shared by every pipeline stage.

use thiserror::Error;

/// All errors produced by the unpack pipeline.
#[derive(Error, Debug)]
pub enum UnpackError {
    /// The escaped storage key could not be decoded.
    #[error("Malformed storage key '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// The requested object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Any other storage backend failure.
    #[error("Storage error on {bucket}/{key}: {reason}")]
    Storage {
        bucket: String,
        key: String,
        reason: String,
    },

    /// The raw bytes are not a parseable MIME message.
    #[error("MIME parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, UnpackError>`.
pub type Result<T> = std::result::Result<T, UnpackError>;

impl UnpackError {
    /// Create a `Storage` variant for the given object.
    pub fn storage(bucket: &str, key: &str, reason: impl Into<String>) -> Self {
        Self::Storage {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a `NotFound` variant for the given object.
    pub fn not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}
