//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. The core depends on these interfaces; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalCache`] - Per-collection offline store (SQLite, in-memory)
//! - [`IRemoteGateway`] - CRUD against the holding backend
//! - [`INotificationService`] - User-facing outcome messages
//! - [`ICollectionObserver`] - Change signal for views that list a collection

pub mod local_cache;
pub mod notification;
pub mod observer;
pub mod remote_gateway;

pub use local_cache::{apply_upsert, position_of, ILocalCache};
pub use notification::{INotificationService, Notification, OutcomeLevel};
pub use observer::{ICollectionObserver, NoopObserver};
pub use remote_gateway::IRemoteGateway;
