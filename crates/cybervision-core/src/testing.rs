//! In-memory port doubles
//!
//! Used by the unit tests of this crate and, through the `testing` feature,
//! by the tests of downstream crates. Everything here is synchronous under a
//! `std::sync::Mutex`; none of it is meant for production wiring.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::bail;

use crate::domain::{
    AdvisorCode, EntityKey, EntityKind, Record, RecordKey, SellerCode,
};
use crate::ports::{
    apply_upsert, position_of, ICollectionObserver, ILocalCache, INotificationService,
    IRemoteGateway, Notification, OutcomeLevel,
};

// ============================================================================
// MemoryCache
// ============================================================================

/// `ILocalCache` backed by a map of vectors
#[derive(Default)]
pub struct MemoryCache {
    collections: Mutex<HashMap<EntityKind, Vec<Record>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a collection without going through the port
    pub fn seed(&self, kind: EntityKind, records: Vec<Record>) {
        self.collections.lock().unwrap().insert(kind, records);
    }

    pub fn records(&self, kind: EntityKind) -> Vec<Record> {
        self.collections
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.records(kind).len()
    }
}

#[async_trait::async_trait]
impl ILocalCache for MemoryCache {
    async fn get_all(&self, kind: EntityKind) -> anyhow::Result<Vec<Record>> {
        Ok(self.records(kind))
    }

    async fn get_by_id(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<Option<Record>> {
        let records = self.records(kind);
        Ok(position_of(&records, kind, key).map(|i| records[i].clone()))
    }

    async fn upsert(&self, kind: EntityKind, key: &RecordKey, record: Record) -> anyhow::Result<()> {
        let mut collections = self.collections.lock().unwrap();
        apply_upsert(collections.entry(kind).or_default(), kind, key, record);
        Ok(())
    }

    async fn upsert_many(
        &self,
        kind: EntityKind,
        records: Vec<(RecordKey, Record)>,
    ) -> anyhow::Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections.entry(kind).or_default();
        for (key, record) in records {
            apply_upsert(collection, kind, &key, record);
        }
        Ok(())
    }

    async fn remove(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<bool> {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections.entry(kind).or_default();
        match position_of(collection, kind, key) {
            Some(index) => {
                collection.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_all(&self, kind: EntityKind, records: Vec<Record>) -> anyhow::Result<()> {
        self.collections.lock().unwrap().insert(kind, records);
        Ok(())
    }
}

// ============================================================================
// ScriptedGateway
// ============================================================================

#[derive(Default)]
struct GatewayState {
    online: bool,
    /// Remaining calls that succeed before the gateway goes down
    budget: Option<usize>,
    store: HashMap<EntityKind, Vec<Record>>,
    calls: Vec<String>,
}

/// `IRemoteGateway` with its own in-memory store and an on/off switch
///
/// Keys are assigned the way the backend does: numeric ids are max + 1 and
/// codes take the next prefixed sequence number.
pub struct ScriptedGateway {
    state: Mutex<GatewayState>,
}

impl ScriptedGateway {
    pub fn new(online: bool) -> Self {
        Self {
            state: Mutex::new(GatewayState {
                online,
                ..Default::default()
            }),
        }
    }

    pub fn set_online(&self, online: bool) {
        let mut state = self.state.lock().unwrap();
        state.online = online;
        state.budget = None;
    }

    /// Lets the next `calls` calls succeed, then fails every call after them
    pub fn fail_after(&self, calls: usize) {
        self.state.lock().unwrap().budget = Some(calls);
    }

    pub fn seed(&self, kind: EntityKind, records: Vec<Record>) {
        self.state.lock().unwrap().store.insert(kind, records);
    }

    pub fn records(&self, kind: EntityKind) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .store
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Calls received so far, e.g. `"create paises"` or `"update empresas 2"`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn admit(state: &mut GatewayState, call: String) -> anyhow::Result<()> {
        state.calls.push(call);
        if !state.online {
            bail!("connection refused");
        }
        if let Some(budget) = state.budget {
            if budget == 0 {
                bail!("connection reset by peer");
            }
            state.budget = Some(budget - 1);
        }
        Ok(())
    }

    fn next_key(kind: EntityKind, records: &[Record]) -> anyhow::Result<RecordKey> {
        let keys: Vec<RecordKey> = records.iter().filter_map(|r| kind.key_of(r)).collect();
        match kind {
            EntityKind::Advisor => {
                let codes: Vec<AdvisorCode> = keys
                    .iter()
                    .filter_map(|k| AdvisorCode::from_record_key(k).ok())
                    .collect();
                Ok(AdvisorCode::next_after(&codes)?.to_record_key())
            }
            EntityKind::Seller => {
                let codes: Vec<SellerCode> = keys
                    .iter()
                    .filter_map(|k| SellerCode::from_record_key(k).ok())
                    .collect();
                Ok(SellerCode::next_after(&codes)?.to_record_key())
            }
            _ => {
                let max = keys
                    .iter()
                    .filter_map(|k| match k {
                        RecordKey::Numeric(n) => Some(*n),
                        RecordKey::Code(_) => None,
                    })
                    .max()
                    .unwrap_or(0);
                max.checked_add(1)
                    .map(RecordKey::Numeric)
                    .ok_or_else(|| anyhow::anyhow!("{} ids exhausted", kind))
            }
        }
    }
}

#[async_trait::async_trait]
impl IRemoteGateway for ScriptedGateway {
    async fn read_all(&self, kind: EntityKind) -> anyhow::Result<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        Self::admit(&mut state, format!("read {}", kind.collection()))?;
        Ok(state.store.get(&kind).cloned().unwrap_or_default())
    }

    async fn create(&self, kind: EntityKind, record: &Record) -> anyhow::Result<Record> {
        let mut state = self.state.lock().unwrap();
        Self::admit(&mut state, format!("create {}", kind.collection()))?;
        let collection = state.store.entry(kind).or_default();
        let key = Self::next_key(kind, collection)?;
        let mut stored = record.clone();
        apply_upsert(collection, kind, &key, stored.clone());
        if let Some(obj) = stored.as_object_mut() {
            obj.insert(kind.key_field().to_string(), key.to_value());
        }
        Ok(stored)
    }

    async fn update(
        &self,
        kind: EntityKind,
        key: &RecordKey,
        record: &Record,
    ) -> anyhow::Result<Record> {
        let mut state = self.state.lock().unwrap();
        Self::admit(&mut state, format!("update {} {}", kind.collection(), key))?;
        let collection = state.store.entry(kind).or_default();
        if position_of(collection, kind, key).is_none() {
            bail!("404 Not Found: {} {}", kind, key);
        }
        apply_upsert(collection, kind, key, record.clone());
        let index = position_of(collection, kind, key).unwrap_or_default();
        Ok(collection[index].clone())
    }

    async fn delete(&self, kind: EntityKind, key: &RecordKey) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::admit(&mut state, format!("delete {} {}", kind.collection(), key))?;
        let collection = state.store.entry(kind).or_default();
        match position_of(collection, kind, key) {
            Some(index) => {
                collection.remove(index);
                Ok(())
            }
            None => bail!("404 Not Found: {} {}", kind, key),
        }
    }
}

// ============================================================================
// RecordingNotifier / RecordingObserver
// ============================================================================

/// `INotificationService` that keeps every notification
#[derive(Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery fail (after recording it)
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    pub fn levels(&self) -> Vec<OutcomeLevel> {
        self.notifications().iter().map(|n| n.level).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications().last().cloned()
    }
}

#[async_trait::async_trait]
impl INotificationService for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.received.lock().unwrap().push(notification.clone());
        if *self.failing.lock().unwrap() {
            bail!("notification channel closed");
        }
        Ok(())
    }
}

/// `ICollectionObserver` that keeps every change signal
#[derive(Default)]
pub struct RecordingObserver {
    changes: Mutex<Vec<EntityKind>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> Vec<EntityKind> {
        self.changes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ICollectionObserver for RecordingObserver {
    async fn collection_changed(&self, kind: EntityKind) {
        self.changes.lock().unwrap().push(kind);
    }
}
