//! Notification service port (driven/secondary port)
//!
//! Interface for telling the user how an operation ended: saved to the
//! backend, saved only locally, or rejected.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because delivery is adapter-specific.
//! - Notifications are fire-and-forget. The reconciliation service logs a
//!   failed delivery and carries on; it never fails the write because of it.

use serde::{Deserialize, Serialize};

use crate::domain::EntityKind;

// ============================================================================
// Notification struct and OutcomeLevel enum
// ============================================================================

/// Severity of an outcome message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeLevel {
    /// Operation completed against the backend
    Success,
    /// Operation completed, but only in the local cache
    Warning,
    /// Operation was rejected
    Error,
}

impl Default for OutcomeLevel {
    fn default() -> Self {
        OutcomeLevel::Success
    }
}

impl std::fmt::Display for OutcomeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutcomeLevel::Success => "success",
            OutcomeLevel::Warning => "warning",
            OutcomeLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// An outcome message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: OutcomeLevel,
    pub title: String,
    pub message: String,
    /// Collection the outcome refers to, if any
    pub kind: Option<EntityKind>,
}

impl Notification {
    pub fn new(level: OutcomeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            kind: None,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(OutcomeLevel::Success, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(OutcomeLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(OutcomeLevel::Error, title, message)
    }

    /// Tags the notification with the collection it concerns
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

// ============================================================================
// INotificationService trait
// ============================================================================

/// Port trait for user-facing outcome messages
///
/// Implementations may print to a terminal, raise a desktop toast or push to
/// a UI channel. They should not block for user interaction.
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Delivers one outcome message
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}
