//! Domain error types.

use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required field was empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
