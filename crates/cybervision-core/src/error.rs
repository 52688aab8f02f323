//! Error taxonomy of the sync and integrity operations
//!
//! Adapter crates report through `anyhow::Result` at the port boundary.
//! Use cases translate those failures, together with domain validation
//! errors, into [`SyncError`] so callers can branch on what went wrong.

use thiserror::Error;

use crate::domain::{DomainError, EntityKind, RecordKey};

/// Errors surfaced by reconciliation and integrity operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// The backend could not be reached or rejected the request
    #[error("Remote backend unavailable: {0}")]
    RemoteUnavailable(String),

    /// The requested record does not exist in the local cache
    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: RecordKey },

    /// A field-level rule was violated; nothing was persisted
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Deleting the record would orphan dependents
    #[error("Cannot delete {kind} {key}: {reason}")]
    IntegrityViolation {
        kind: EntityKind,
        key: RecordKey,
        reason: String,
    },

    /// A record points at another record that does not exist
    #[error("Referenced {kind} {key} does not exist")]
    UnknownReference { kind: EntityKind, key: RecordKey },

    /// The reassignment destination cannot take the dependents
    #[error("Cannot reassign to {kind} {key}: {reason}")]
    InvalidReassignTarget {
        kind: EntityKind,
        key: RecordKey,
        reason: String,
    },

    /// There is no other record to reassign dependents to
    #[error("No other {kind} is available to receive the dependents")]
    ReassignUnavailable { kind: EntityKind },

    /// A stored or received record could not be parsed
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The local cache failed; the operation did not complete
    #[error("Local cache error: {0:#}")]
    Cache(anyhow::Error),
}

impl SyncError {
    pub fn not_found(kind: EntityKind, key: RecordKey) -> Self {
        SyncError::NotFound { kind, key }
    }

    /// Returns `true` for errors caused by the caller's input rather than storage
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            SyncError::Cache(_) | SyncError::RemoteUnavailable(_) | SyncError::InvalidRecord(_)
        )
    }
}

impl From<DomainError> for SyncError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationFailed(msg) => SyncError::ValidationFailed(msg),
            DomainError::InvalidId(msg) => SyncError::ValidationFailed(msg),
            DomainError::InvalidRecord(msg) => SyncError::InvalidRecord(msg),
        }
    }
}
