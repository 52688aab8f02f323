//! CyberVision Cache - Local collection persistence
//!
//! SQLite-based offline store for the holding's collections (countries,
//! companies, advisors, sellers, recruitments, advisories, market areas).
//!
//! ## Architecture
//!
//! This crate implements the `ILocalCache` port from `cybervision-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Opens the cache file and applies the schema
//! - [`SqliteLocalCache`] - Full `ILocalCache` implementation
//! - [`CacheError`] - What the adapter reports before `anyhow` wraps it
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use cybervision_cache::{DatabasePool, SqliteLocalCache};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/cybervision/cache.db")).await?;
//! let cache = SqliteLocalCache::new(pool.pool().clone());
//! // Use cache as ILocalCache...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::SqliteLocalCache;

/// Failures of the SQLite cache adapter
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache file could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The collections table could not be created
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored collection is not a JSON array of records
    #[error("Corrupted collection '{collection}': {reason}")]
    CorruptedCollection { collection: String, reason: String },

    /// A collection could not be encoded back to JSON
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}
