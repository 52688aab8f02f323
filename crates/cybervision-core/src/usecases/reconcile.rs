//! Reconciliation use case
//!
//! Every write goes to the backend first. When the backend answers, its
//! record is authoritative and is mirrored into the local cache. When it
//! does not, the write lands in the cache only and the user is warned. No
//! retry is attempted and local-only writes are not pushed later.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    normalize_name, Advisor, Advisory, Company, Country, DomainError, Entity, EntityKey,
    EntityKind, MarketArea, Record, RecordKey, Recruitment, RecruitmentForest, Seller, SellerCode,
};
use crate::error::SyncError;
use crate::ports::{
    ICollectionObserver, ILocalCache, INotificationService, IRemoteGateway, Notification,
};

// ============================================================================
// Outcome types
// ============================================================================

/// Where a write ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    /// Accepted by the backend and mirrored locally
    Remote,
    /// Stored in the local cache only
    LocalOnly,
}

impl Persistence {
    pub fn is_local_only(&self) -> bool {
        matches!(self, Persistence::LocalOnly)
    }

    /// Combines two outcomes; any local-only step makes the whole local-only
    pub fn merge(self, other: Persistence) -> Persistence {
        if self.is_local_only() || other.is_local_only() {
            Persistence::LocalOnly
        } else {
            Persistence::Remote
        }
    }
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct Saved<E: Entity> {
    pub entity: E,
    pub key: E::Key,
    pub persistence: Persistence,
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
    /// Whether a record was removed from the cache
    pub removed: bool,
    pub persistence: Persistence,
}

/// Where a listing was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    Remote,
    Cache,
}

/// Result of [`ReconciliationService::fetch_all`]
#[derive(Debug, Clone)]
pub struct Fetched<E> {
    pub items: Vec<E>,
    pub source: FetchSource,
}

/// Per-collection line of [`ReconciliationService::refresh_all`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub kind: EntityKind,
    pub count: usize,
    pub source: FetchSource,
}

// ============================================================================
// Typed cache reads
// ============================================================================

/// Loads a whole collection from the cache, skipping records that do not parse
pub async fn load_collection<E: Entity>(cache: &dyn ILocalCache) -> Result<Vec<E>, SyncError> {
    let records = cache.get_all(E::KIND).await.map_err(SyncError::Cache)?;
    Ok(parse_records(records, E::from_record))
}

fn parse_records<E: Entity>(
    records: Vec<Record>,
    parse: fn(Record) -> Result<E, DomainError>,
) -> Vec<E> {
    records
        .into_iter()
        .filter_map(|record| match parse(record) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(kind = %E::KIND, error = %e, "Skipping unparsable record");
                None
            }
        })
        .collect()
}

// ============================================================================
// ReconciliationService
// ============================================================================

/// Remote-first persistence with local fallback
pub struct ReconciliationService {
    cache: Arc<dyn ILocalCache>,
    remote: Arc<dyn IRemoteGateway>,
    notifier: Arc<dyn INotificationService>,
    observer: Arc<dyn ICollectionObserver>,
}

impl ReconciliationService {
    /// Creates a new ReconciliationService
    ///
    /// # Arguments
    ///
    /// * `cache` - Offline store mirrored after every remote write
    /// * `remote` - Backend gateway tried first on every write
    /// * `notifier` - Receives one outcome message per operation
    /// * `observer` - Told which collection changed after each write
    pub fn new(
        cache: Arc<dyn ILocalCache>,
        remote: Arc<dyn IRemoteGateway>,
        notifier: Arc<dyn INotificationService>,
        observer: Arc<dyn ICollectionObserver>,
    ) -> Self {
        Self {
            cache,
            remote,
            notifier,
            observer,
        }
    }

    pub fn cache(&self) -> &Arc<dyn ILocalCache> {
        &self.cache
    }

    /// Delivers an outcome message; delivery failures are only logged
    pub async fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(
                title = %notification.title,
                error = %e,
                "Failed to deliver notification"
            );
        }
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Every cached record of a collection
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>, SyncError> {
        load_collection(self.cache.as_ref()).await
    }

    /// Cached record by key, `None` when absent
    pub async fn find<E: Entity>(&self, key: &E::Key) -> Result<Option<E>, SyncError> {
        let record = self
            .cache
            .get_by_id(E::KIND, &key.to_record_key())
            .await
            .map_err(SyncError::Cache)?;
        Ok(record.map(E::from_record).transpose()?)
    }

    /// Cached record by key, `NotFound` when absent
    pub async fn get<E: Entity>(&self, key: &E::Key) -> Result<E, SyncError> {
        self.find(key)
            .await?
            .ok_or_else(|| SyncError::not_found(E::KIND, key.to_record_key()))
    }

    /// Reads the collection from the backend and replaces the cached copy
    ///
    /// Falls back to the cached collection when the backend is unreachable.
    pub async fn fetch_all<E: Entity>(&self) -> Result<Fetched<E>, SyncError> {
        let kind = E::KIND;
        match self.remote.read_all(kind).await {
            Ok(records) => {
                let received = records.len();
                let items: Vec<E> = parse_records(records, E::from_checked_record);
                let normalized = items
                    .iter()
                    .map(|item| item.to_record())
                    .collect::<Result<Vec<_>, _>>()?;
                self.cache
                    .replace_all(kind, normalized)
                    .await
                    .map_err(SyncError::Cache)?;
                self.observer.collection_changed(kind).await;
                info!(
                    kind = %kind,
                    received,
                    kept = items.len(),
                    "Collection refreshed from backend"
                );
                Ok(Fetched {
                    items,
                    source: FetchSource::Remote,
                })
            }
            Err(err) => {
                warn!(kind = %kind, error = %err, "Backend read failed, serving cached collection");
                let items = self.list().await?;
                Ok(Fetched {
                    items,
                    source: FetchSource::Cache,
                })
            }
        }
    }

    /// Refreshes every collection, referenced kinds first
    pub async fn refresh_all(&self) -> Result<Vec<RefreshSummary>, SyncError> {
        let summary = vec![
            self.refresh::<Country>().await?,
            self.refresh::<MarketArea>().await?,
            self.refresh::<Company>().await?,
            self.refresh::<Advisor>().await?,
            self.refresh::<Seller>().await?,
            self.refresh::<Recruitment>().await?,
            self.refresh::<Advisory>().await?,
        ];

        let stale = summary
            .iter()
            .filter(|s| s.source == FetchSource::Cache)
            .count();
        if stale == 0 {
            self.notify(Notification::success(
                "Data refreshed",
                "All collections were loaded from the database",
            ))
            .await;
        } else {
            self.notify(Notification::warning(
                "Showing cached data",
                format!(
                    "{} of {} collections could not be loaded from the database",
                    stale,
                    summary.len()
                ),
            ))
            .await;
        }
        Ok(summary)
    }

    async fn refresh<E: Entity>(&self) -> Result<RefreshSummary, SyncError> {
        let fetched = self.fetch_all::<E>().await?;
        Ok(RefreshSummary {
            kind: E::KIND,
            count: fetched.items.len(),
            source: fetched.source,
        })
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Creates (`id == None`) or updates a record
    ///
    /// Validation, uniqueness and reference checks run before any remote call;
    /// a rejected save writes nothing and reports an error outcome.
    pub async fn save<E: Entity>(&self, id: Option<E::Key>, data: E) -> Result<Saved<E>, SyncError> {
        match self.try_save(id, data).await {
            Ok(saved) => Ok(saved),
            Err(err) => {
                self.notify(
                    Notification::error(format!("{} not saved", E::KIND.title()), err.to_string())
                        .with_kind(E::KIND),
                )
                .await;
                Err(err)
            }
        }
    }

    async fn try_save<E: Entity>(&self, id: Option<E::Key>, data: E) -> Result<Saved<E>, SyncError> {
        let kind = E::KIND;
        let updating = id.is_some();
        let mut data = self.prepare(id.as_ref(), data).await?;
        let record = data.to_record()?;

        let remote = match &id {
            None => self.remote.create(kind, &record).await,
            Some(key) => self.remote.update(kind, &key.to_record_key(), &record).await,
        };

        let accepted = match remote {
            Ok(stored) => accept_remote(stored, &data, id.as_ref()),
            Err(err) => {
                warn!(kind = %kind, error = %err, "Remote save failed, falling back to local cache");
                None
            }
        };

        let mut saved = match accepted {
            Some((entity, key)) => Saved {
                entity,
                key,
                persistence: Persistence::Remote,
            },
            None => {
                let key = match id {
                    Some(key) => key,
                    None => self.next_key::<E>().await?,
                };
                data.set_key(key.clone());
                Saved {
                    entity: data,
                    key,
                    persistence: Persistence::LocalOnly,
                }
            }
        };

        self.cache
            .upsert(kind, &saved.key.to_record_key(), saved.entity.to_record()?)
            .await
            .map_err(SyncError::Cache)?;

        info!(
            kind = %kind,
            key = %saved.key,
            persistence = ?saved.persistence,
            "Record saved"
        );
        let name = saved.entity.display_name();
        let notification = match saved.persistence {
            Persistence::Remote => Notification::success(
                format!("{} saved", kind.title()),
                format!("{} was saved to the database", name),
            ),
            Persistence::LocalOnly => Notification::warning(
                format!("{} saved locally", kind.title()),
                format!(
                    "The database could not be reached; {} was saved in the local cache",
                    name
                ),
            ),
        };
        self.notify(notification.with_kind(kind)).await;
        self.observer.collection_changed(kind).await;

        if kind == EntityKind::Seller && updating {
            let downline = self.relevel_downline(&saved.key.to_record_key()).await?;
            saved.persistence = saved.persistence.merge(downline);
        }

        Ok(saved)
    }

    /// Updates several existing records of one collection
    ///
    /// Each item is sent to the backend in order. After the first backend
    /// failure the remaining items are kept local without further remote
    /// attempts. The cache is written once at the end. Errors are returned
    /// to the caller without an outcome message.
    pub async fn save_batch<E: Entity>(&self, items: Vec<E>) -> Result<Vec<Saved<E>>, SyncError> {
        let kind = E::KIND;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut prepared = Vec::with_capacity(items.len());
        for item in items {
            let key = item.key().cloned().ok_or_else(|| {
                SyncError::ValidationFailed(format!("batch update of {} requires keyed records", kind))
            })?;
            let item = self.prepare(Some(&key), item).await?;
            prepared.push((key, item));
        }

        let total = prepared.len();
        let mut online = true;
        let mut saved = Vec::with_capacity(total);
        for (key, item) in prepared {
            if online {
                let record = item.to_record()?;
                match self.remote.update(kind, &key.to_record_key(), &record).await {
                    Ok(stored) => {
                        if let Some((entity, key)) = accept_remote(stored, &item, Some(&key)) {
                            saved.push(Saved {
                                entity,
                                key,
                                persistence: Persistence::Remote,
                            });
                            continue;
                        }
                    }
                    Err(err) => {
                        warn!(
                            kind = %kind,
                            key = %key,
                            error = %err,
                            "Remote batch update failed, keeping remaining items local"
                        );
                        online = false;
                    }
                }
            }
            saved.push(Saved {
                entity: item,
                key,
                persistence: Persistence::LocalOnly,
            });
        }

        let records = saved
            .iter()
            .map(|s| Ok((s.key.to_record_key(), s.entity.to_record()?)))
            .collect::<Result<Vec<_>, SyncError>>()?;
        self.cache
            .upsert_many(kind, records)
            .await
            .map_err(SyncError::Cache)?;

        let local = saved.iter().filter(|s| s.persistence.is_local_only()).count();
        info!(kind = %kind, total, local, "Batch saved");
        self.observer.collection_changed(kind).await;

        Ok(saved)
    }

    /// Deletes a record remotely, then locally
    ///
    /// The cached record is removed even when the backend delete fails.
    pub async fn delete<E: Entity>(&self, key: &E::Key) -> Result<Deleted, SyncError> {
        let kind = E::KIND;
        let record_key = key.to_record_key();

        let existing = self
            .cache
            .get_by_id(kind, &record_key)
            .await
            .map_err(SyncError::Cache)?;
        let Some(existing) = existing else {
            let err = SyncError::not_found(kind, record_key);
            self.notify(
                Notification::error(format!("{} not deleted", kind.title()), err.to_string())
                    .with_kind(kind),
            )
            .await;
            return Err(err);
        };
        let name = E::from_record(existing)
            .map(|e| e.display_name())
            .unwrap_or_else(|_| format!("{} {}", kind, key));

        let persistence = match self.remote.delete(kind, &record_key).await {
            Ok(()) => Persistence::Remote,
            Err(err) => {
                warn!(kind = %kind, key = %key, error = %err, "Remote delete failed, deleting locally only");
                Persistence::LocalOnly
            }
        };

        let removed = self
            .cache
            .remove(kind, &record_key)
            .await
            .map_err(SyncError::Cache)?;

        info!(kind = %kind, key = %key, persistence = ?persistence, "Record deleted");
        let notification = match persistence {
            Persistence::Remote => Notification::success(
                format!("{} deleted", kind.title()),
                format!("{} was deleted from the database", name),
            ),
            Persistence::LocalOnly => Notification::warning(
                format!("{} deleted locally", kind.title()),
                format!(
                    "The database could not be reached; {} was removed from the local cache",
                    name
                ),
            ),
        };
        self.notify(notification.with_kind(kind)).await;
        self.observer.collection_changed(kind).await;

        Ok(Deleted {
            removed,
            persistence,
        })
    }

    /// Recomputes the stored level of every seller below `code`
    ///
    /// Only sellers whose level changed are written.
    async fn relevel_downline(&self, code: &RecordKey) -> Result<Persistence, SyncError> {
        let Ok(code) = SellerCode::from_record_key(code) else {
            return Ok(Persistence::Remote);
        };
        let sellers: Vec<Seller> = self.list().await?;
        let forest = RecruitmentForest::from_sellers(&sellers);
        let downline = forest.descendants(&code);
        let stale: Vec<Seller> = sellers
            .into_iter()
            .filter(|s| {
                s.code
                    .as_ref()
                    .is_some_and(|c| downline.contains(c) && forest.level(c) != s.level)
            })
            .collect();
        if stale.is_empty() {
            return Ok(Persistence::Remote);
        }

        debug!(seller = %code, stale = stale.len(), "Refreshing downline levels");
        let saved = self.save_batch(stale).await?;
        Ok(saved
            .iter()
            .fold(Persistence::Remote, |acc, s| acc.merge(s.persistence)))
    }

    // ------------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------------

    /// Runs every check a save would run, without writing anything
    ///
    /// Returns the record as it would be stored, with derived fields filled.
    pub async fn check<E: Entity>(&self, id: Option<&E::Key>, data: E) -> Result<E, SyncError> {
        self.prepare(id, data).await
    }

    async fn prepare<E: Entity>(&self, id: Option<&E::Key>, mut data: E) -> Result<E, SyncError> {
        if let Some(key) = id {
            data.set_key(key.clone());
        }
        data.validate()?;

        if let Some(key) = id {
            let exists = self
                .cache
                .get_by_id(E::KIND, &key.to_record_key())
                .await
                .map_err(SyncError::Cache)?
                .is_some();
            if !exists {
                return Err(SyncError::not_found(E::KIND, key.to_record_key()));
            }
        }

        self.check_unique(&data, id).await?;
        self.check_references(&data).await?;

        if E::KIND == EntityKind::Seller {
            let sellers: Vec<Seller> = self.list().await?;
            let forest = RecruitmentForest::from_sellers(&sellers);
            data.derive_fields(&forest)?;
        }
        Ok(data)
    }

    async fn check_unique<E: Entity>(&self, data: &E, exclude: Option<&E::Key>) -> Result<(), SyncError> {
        let Some(name) = data.unique_name() else {
            return Ok(());
        };
        let wanted = normalize_name(name);
        let existing: Vec<E> = self.list().await?;
        let clash = existing
            .iter()
            .filter(|other| exclude.map_or(true, |key| other.key() != Some(key)))
            .any(|other| other.unique_name().map(normalize_name).as_deref() == Some(wanted.as_str()));
        if clash {
            return Err(SyncError::ValidationFailed(format!(
                "a {} named '{}' already exists",
                E::KIND,
                name.trim()
            )));
        }
        Ok(())
    }

    async fn check_references<E: Entity>(&self, data: &E) -> Result<(), SyncError> {
        for (kind, key) in data.references() {
            let exists = self
                .cache
                .get_by_id(kind, &key)
                .await
                .map_err(SyncError::Cache)?
                .is_some();
            if !exists {
                debug!(kind = %kind, key = %key, "Reference does not resolve");
                return Err(SyncError::UnknownReference { kind, key });
            }
        }
        Ok(())
    }

    async fn next_key<E: Entity>(&self) -> Result<E::Key, SyncError> {
        let records = self
            .cache
            .get_all(E::KIND)
            .await
            .map_err(SyncError::Cache)?;
        let keys: Vec<E::Key> = records
            .iter()
            .filter_map(|r| E::KIND.key_of(r))
            .filter_map(|k| E::Key::from_record_key(&k).ok())
            .collect();
        Ok(E::Key::next_after(&keys)?)
    }
}

/// Resolves the backend's answer to an accepted write
///
/// A valid answer is authoritative. An answer that does not parse or
/// validate is replaced by the submitted record under the backend's key, or
/// `requested` when updating. `None` means no key is known and the write has
/// to be kept local.
fn accept_remote<E: Entity>(
    stored: Record,
    submitted: &E,
    requested: Option<&E::Key>,
) -> Option<(E, E::Key)> {
    let backend_key = E::KIND
        .key_of(&stored)
        .and_then(|k| E::Key::from_record_key(&k).ok());

    let mut entity = match E::from_checked_record(stored) {
        Ok(entity) => entity,
        Err(e) => {
            warn!(
                kind = %E::KIND,
                error = %e,
                "Backend accepted the write but its answer was rejected, keeping the submitted record"
            );
            submitted.clone()
        }
    };

    let key = requested
        .cloned()
        .or(backend_key)
        .or_else(|| entity.key().cloned());
    let Some(key) = key else {
        warn!(kind = %E::KIND, "Backend answer carries no key, keeping the write local");
        return None;
    };
    entity.set_key(key.clone());
    Some((entity, key))
}
