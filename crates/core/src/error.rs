//! Encoding error types

use thiserror::Error;

/// Result type for encoding operations
pub type Result<T> = std::result::Result<T, EncodeError>;

/// Errors that can occur while encoding a field or a record
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Record carried neither fields nor context
    #[error("record has no fields to encode")]
    EmptyRecord,

    /// Reflected value could not be rendered as JSON
    #[error("failed to render reflected value: {0}")]
    Reflected(#[from] serde_json::Error),

    /// Array or object marshaler reported a failure
    #[error("marshal failed: {0}")]
    Marshal(String),
}

impl EncodeError {
    /// Create a Marshal error
    pub fn marshal(message: impl Into<String>) -> Self {
        Self::Marshal(message.into())
    }
}
