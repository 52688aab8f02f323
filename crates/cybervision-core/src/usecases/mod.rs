//! Use cases - application services orchestrating domain logic through ports
//!
//! - [`ReconciliationService`] - remote-first saves and deletes with local fallback
//! - [`ReportUseCase`] - holding-wide aggregates over the local cache

pub mod reconcile;
pub mod report;

pub use reconcile::{
    load_collection, Deleted, FetchSource, Fetched, Persistence, ReconciliationService,
    RefreshSummary, Saved,
};
pub use report::{CacheSnapshot, CompanyCount, CountryCount, HoldingReport, ReportUseCase, Totals};
