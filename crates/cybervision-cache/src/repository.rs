//! SQLite implementation of ILocalCache
//!
//! Each collection is one row of the `collections` table whose `records`
//! column holds the ordered JSON array of the collection. Every write is a
//! read-modify-write of that row inside one transaction, which keeps each
//! collection consistent on its own. Writes spanning several collections are
//! not atomic.

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use cybervision_core::domain::{EntityKind, Record, RecordKey};
use cybervision_core::ports::{apply_upsert, position_of, ILocalCache};

use crate::CacheError;

/// SQLite-based implementation of the local cache port
pub struct SqliteLocalCache {
    pool: SqlitePool,
}

impl SqliteLocalCache {
    /// Creates a new cache instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of records in every collection, in dependency order
    pub async fn counts(&self) -> Result<Vec<(EntityKind, usize)>, CacheError> {
        let mut out = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            out.push((kind, self.read(kind).await?.len()));
        }
        Ok(out)
    }

    async fn read(&self, kind: EntityKind) -> Result<Vec<Record>, CacheError> {
        let raw: Option<String> =
            sqlx::query_scalar::<Sqlite, String>("SELECT records FROM collections WHERE name = ?")
                .bind(kind.collection())
                .fetch_optional(&self.pool)
                .await?;
        decode(kind, raw)
    }

    /// Runs `f` over the collection inside a transaction and stores the result
    async fn modify<T, F>(&self, kind: EntityKind, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&mut Vec<Record>) -> T + Send,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;

        let raw: Option<String> =
            sqlx::query_scalar::<Sqlite, String>("SELECT records FROM collections WHERE name = ?")
                .bind(kind.collection())
                .fetch_optional(&mut *tx)
                .await?;
        let mut records = decode(kind, raw)?;

        let result = f(&mut records);

        store(&mut tx, kind, &records).await?;
        tx.commit().await?;

        debug!(collection = kind.collection(), len = records.len(), "Collection written");
        Ok(result)
    }
}

fn decode(kind: EntityKind, raw: Option<String>) -> Result<Vec<Record>, CacheError> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) => {
            serde_json::from_str::<Vec<Record>>(&text).map_err(|e| CacheError::CorruptedCollection {
                collection: kind.collection().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

async fn store(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    records: &[Record],
) -> Result<(), CacheError> {
    let json = serde_json::to_string(records)?;
    sqlx::query(
        r#"
        INSERT INTO collections (name, records, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            records = excluded.records,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(kind.collection())
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(conn)
    .await?;
    Ok(())
}

// ============================================================================
// ILocalCache implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalCache for SqliteLocalCache {
    async fn get_all(&self, kind: EntityKind) -> anyhow::Result<Vec<Record>> {
        Ok(self.read(kind).await?)
    }

    async fn get_by_id(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<Option<Record>> {
        let mut records = self.read(kind).await?;
        Ok(position_of(&records, kind, key).map(|index| records.swap_remove(index)))
    }

    async fn upsert(&self, kind: EntityKind, key: &RecordKey, record: Record) -> anyhow::Result<()> {
        debug!(collection = kind.collection(), key = %key, "Upserting record");
        self.modify(kind, |records| apply_upsert(records, kind, key, record))
            .await?;
        Ok(())
    }

    async fn upsert_many(
        &self,
        kind: EntityKind,
        records: Vec<(RecordKey, Record)>,
    ) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        debug!(collection = kind.collection(), count = records.len(), "Upserting records");
        self.modify(kind, |stored| {
            for (key, record) in records {
                apply_upsert(stored, kind, &key, record);
            }
        })
        .await?;
        Ok(())
    }

    async fn remove(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<bool> {
        debug!(collection = kind.collection(), key = %key, "Removing record");
        let removed = self
            .modify(kind, |records| match position_of(records, kind, key) {
                Some(index) => {
                    records.remove(index);
                    true
                }
                None => false,
            })
            .await?;
        Ok(removed)
    }

    async fn replace_all(&self, kind: EntityKind, records: Vec<Record>) -> anyhow::Result<()> {
        debug!(collection = kind.collection(), count = records.len(), "Replacing collection");
        self.modify(kind, |stored| *stored = records).await?;
        Ok(())
    }
}
