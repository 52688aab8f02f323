//! Delete policies
//!
//! A parent with dependents is only deleted under an explicit policy. The
//! configuration may preset one for countries so the CLI can apply it when
//! no flag is given.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// What happens to the dependents of a deleted parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy<K> {
    /// Dependents are retired (deactivated), never hard-deleted
    Cascade,
    /// Dependents are re-pointed to another parent of the same kind
    Reassign(K),
}

impl<K: fmt::Display> fmt::Display for DeletePolicy<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Cascade => write!(f, "cascade"),
            DeletePolicy::Reassign(dest) => write!(f, "reassign to {}", dest),
        }
    }
}

/// Country delete policy preset from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyPreset {
    /// No preset: deleting a parent with dependents is refused until the
    /// user picks a policy
    #[default]
    Ask,
    Cascade,
}

impl PolicyPreset {
    /// Parses a configuration value (`ask` or `cascade`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Some(PolicyPreset::Ask),
            "cascade" => Some(PolicyPreset::Cascade),
            _ => None,
        }
    }

    /// Parses a configuration value, falling back to `Ask` when unknown
    pub fn from_config(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!(value = %s, "Unknown delete policy preset, using 'ask'");
            PolicyPreset::Ask
        })
    }

    /// Picks the policy to apply; an explicit choice always wins
    pub fn resolve<K>(self, explicit: Option<DeletePolicy<K>>) -> Option<DeletePolicy<K>> {
        let policy = explicit.or(match self {
            PolicyPreset::Ask => None,
            PolicyPreset::Cascade => Some(DeletePolicy::Cascade),
        });
        debug!(preset = ?self, resolved = policy.is_some(), "Delete policy resolved");
        policy
    }
}
