//! CyberVision Integrity - Referential integrity for parent deletions
//!
//! Provides:
//! - Dependent checks before countries, companies and advisors are deleted
//! - Delete policies: cascade (retire dependents) or reassign (re-point them)
//! - Recruitment recording with cycle checks and level refresh
//!
//! All writes go through [`ReconciliationService`](cybervision_core::usecases::ReconciliationService),
//! so every step gets the same remote-first, local-fallback treatment. A
//! multi-step deletion is not atomic: steps completed before a failure stay
//! applied.

pub mod manager;
pub mod plan;
pub mod policy;
pub mod recruitment;

pub use manager::IntegrityManager;
pub use plan::{AppliedPolicy, DeletionPlan, DeletionReport};
pub use policy::{DeletePolicy, PolicyPreset};
pub use recruitment::{RecruitmentOutcome, RecruitmentService};
