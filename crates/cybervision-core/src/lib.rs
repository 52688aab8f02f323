//! CyberVision Core - Domain model and data-sync rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Country`, `Company`, `Advisor`, `Seller`, `Recruitment`,
//!   `Advisory`, `MarketArea`
//! - **Use cases** - `ReconciliationService` (remote-first writes with local fallback)
//!   and `ReportUseCase` (holding-wide aggregates)
//! - **Port definitions** - Traits for adapters: `ILocalCache`, `IRemoteGateway`,
//!   `INotificationService`, `ICollectionObserver`
//!
//! # Architecture
//!
//! The domain module holds pure business rules and validation. Ports define the
//! trait interfaces that adapter crates implement. Records cross the ports as
//! untyped JSON and are parsed into domain entities at this boundary, so a
//! malformed cached or remote record never reaches business logic.

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::SyncError;
