//! Error types for blobcat core.

use thiserror::Error;

/// Errors raised while constructing core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid content id {value:?}: {reason}")]
    InvalidContentId { value: String, reason: &'static str },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
