//! Domain error types
//!
//! Errors raised while constructing or validating domain entities. They carry
//! no I/O context; the use-case layer lifts them into [`crate::SyncError`].

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field is missing or a value is out of range
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Identifier could not be parsed or has the wrong shape
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A stored or received record does not match the entity schema
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl DomainError {
    /// Shorthand for a [`DomainError::ValidationFailed`] with a formatted message
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::ValidationFailed(message.into())
    }
}
