//! `IRemoteGateway` adapters
//!
//! [`HttpRemoteGateway`] maps entity kinds onto the backend's REST
//! collections. [`OfflineGateway`] fails every call, which sends every write
//! down the local-fallback path when remote access is disabled.

use anyhow::{Context, Result};
use tracing::debug;

use cybervision_core::domain::{EntityKind, Record, RecordKey};
use cybervision_core::ports::IRemoteGateway;

use crate::client::HoldingClient;
use crate::RemoteError;

/// REST collection name of an entity kind
///
/// Matches the local collection names except for market areas, which the
/// backend serves under a hyphenated path.
pub fn resource(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::MarketArea => "areas-mercado",
        other => other.collection(),
    }
}

// ============================================================================
// HttpRemoteGateway
// ============================================================================

/// Remote gateway that delegates to the holding REST API
pub struct HttpRemoteGateway {
    client: HoldingClient,
}

impl HttpRemoteGateway {
    /// Creates a new `HttpRemoteGateway` wrapping the given [`HoldingClient`]
    pub fn new(client: HoldingClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &HoldingClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteGateway for HttpRemoteGateway {
    async fn read_all(&self, kind: EntityKind) -> Result<Vec<Record>> {
        debug!(kind = %kind, "HttpRemoteGateway::read_all");
        self.client
            .list(resource(kind))
            .await
            .with_context(|| format!("Failed to read {} from backend", resource(kind)))
    }

    async fn create(&self, kind: EntityKind, record: &Record) -> Result<Record> {
        debug!(kind = %kind, "HttpRemoteGateway::create");
        self.client
            .create(resource(kind), record)
            .await
            .with_context(|| format!("Failed to create {} on backend", kind))
    }

    async fn update(&self, kind: EntityKind, key: &RecordKey, record: &Record) -> Result<Record> {
        debug!(kind = %kind, key = %key, "HttpRemoteGateway::update");
        self.client
            .update(resource(kind), &key.to_string(), record)
            .await
            .with_context(|| format!("Failed to update {} {} on backend", kind, key))
    }

    async fn delete(&self, kind: EntityKind, key: &RecordKey) -> Result<()> {
        debug!(kind = %kind, key = %key, "HttpRemoteGateway::delete");
        self.client
            .delete(resource(kind), &key.to_string())
            .await
            .with_context(|| format!("Failed to delete {} {} on backend", kind, key))
    }
}

// ============================================================================
// OfflineGateway
// ============================================================================

/// Remote gateway used when remote access is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGateway;

#[async_trait::async_trait]
impl IRemoteGateway for OfflineGateway {
    async fn read_all(&self, _kind: EntityKind) -> Result<Vec<Record>> {
        Err(RemoteError::Offline.into())
    }

    async fn create(&self, _kind: EntityKind, _record: &Record) -> Result<Record> {
        Err(RemoteError::Offline.into())
    }

    async fn update(&self, _kind: EntityKind, _key: &RecordKey, _record: &Record) -> Result<Record> {
        Err(RemoteError::Offline.into())
    }

    async fn delete(&self, _kind: EntityKind, _key: &RecordKey) -> Result<()> {
        Err(RemoteError::Offline.into())
    }
}
