//! Local cache port (driven/secondary port)
//!
//! Offline store holding one ordered list of records per collection.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//! - Records are untyped JSON; the core parses them into entities.
//! - `upsert` replaces a record in place when the key already exists and
//!   appends otherwise, so list order is stable across edits.
//! - Each call is atomic with respect to its own collection.

use crate::domain::{EntityKind, Record, RecordKey};

#[async_trait::async_trait]
pub trait ILocalCache: Send + Sync {
    /// Returns every record of a collection in stored order
    async fn get_all(&self, kind: EntityKind) -> anyhow::Result<Vec<Record>>;

    /// Looks up one record by key
    async fn get_by_id(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<Option<Record>>;

    /// Inserts or replaces the record stored under `key`
    ///
    /// The key field of the stored record is forced to `key`.
    async fn upsert(&self, kind: EntityKind, key: &RecordKey, record: Record) -> anyhow::Result<()>;

    /// Applies several upserts in one step
    async fn upsert_many(
        &self,
        kind: EntityKind,
        records: Vec<(RecordKey, Record)>,
    ) -> anyhow::Result<()>;

    /// Removes a record; returns `true` if something was removed
    async fn remove(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<bool>;

    /// Replaces a whole collection
    async fn replace_all(&self, kind: EntityKind, records: Vec<Record>) -> anyhow::Result<()>;
}

/// Index of the record stored under `key`, if any
pub fn position_of(records: &[Record], kind: EntityKind, key: &RecordKey) -> Option<usize> {
    records
        .iter()
        .position(|r| kind.key_of(r).as_ref() == Some(key))
}

/// Replace-in-place or append, shared by every cache adapter
pub fn apply_upsert(records: &mut Vec<Record>, kind: EntityKind, key: &RecordKey, mut record: Record) {
    if let Some(obj) = record.as_object_mut() {
        obj.insert(kind.key_field().to_string(), key.to_value());
    }
    match position_of(records, kind, key) {
        Some(index) => records[index] = record,
        None => records.push(record),
    }
}
