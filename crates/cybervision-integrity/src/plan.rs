//! Deletion plans and reports

use serde::Serialize;

use cybervision_core::domain::{EntityKind, RecordKey};
use cybervision_core::usecases::Persistence;

/// What deleting a parent would touch, computed from the local cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionPlan {
    pub kind: EntityKind,
    pub key: RecordKey,
    pub name: String,
    pub dependent_kind: EntityKind,
    /// Records that still reference the parent
    pub dependents: Vec<RecordKey>,
    /// Parents of the same kind the dependents could move to
    pub targets: Vec<RecordKey>,
}

impl DeletionPlan {
    pub fn has_dependents(&self) -> bool {
        !self.dependents.is_empty()
    }

    pub fn can_reassign(&self) -> bool {
        !self.targets.is_empty()
    }
}

/// The policy actually carried out by a deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "target")]
pub enum AppliedPolicy {
    /// The parent had no dependents
    None,
    Cascade,
    Reassign(RecordKey),
}

/// Outcome of a completed deletion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletionReport {
    pub kind: EntityKind,
    pub key: RecordKey,
    pub name: String,
    pub policy_applied: AppliedPolicy,
    /// Dependents that were retired or re-pointed
    pub affected: Vec<RecordKey>,
    /// The parent was kept as an inactive record instead of being removed
    pub retired: bool,
    /// `LocalOnly` when any step fell back to the cache
    pub persistence: Persistence,
}
