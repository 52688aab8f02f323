//! Collection change port
//!
//! Fired after every successful write so that whatever is listing the
//! collection can refresh. Observers must not fail the write.

use crate::domain::EntityKind;

#[async_trait::async_trait]
pub trait ICollectionObserver: Send + Sync {
    /// Called once per completed write to `kind`
    async fn collection_changed(&self, kind: EntityKind);
}

/// Observer that ignores every change
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

#[async_trait::async_trait]
impl ICollectionObserver for NoopObserver {
    async fn collection_changed(&self, _kind: EntityKind) {}
}
