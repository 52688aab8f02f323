//! Remote gateway port (driven/secondary port)
//!
//! CRUD access to the holding backend. Any error means "the remote write
//! did not happen"; the reconciliation service decides whether to fall
//! back to the local cache.

use crate::domain::{EntityKind, Record, RecordKey};

#[async_trait::async_trait]
pub trait IRemoteGateway: Send + Sync {
    /// Fetches the full collection
    async fn read_all(&self, kind: EntityKind) -> anyhow::Result<Vec<Record>>;

    /// Creates a record; returns the stored record including its assigned key
    async fn create(&self, kind: EntityKind, record: &Record) -> anyhow::Result<Record>;

    /// Overwrites the record stored under `key`; returns the stored record
    async fn update(&self, kind: EntityKind, key: &RecordKey, record: &Record)
        -> anyhow::Result<Record>;

    /// Deletes the record stored under `key`
    async fn delete(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<()>;
}
