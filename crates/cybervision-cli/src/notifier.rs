//! Console adapters for the outcome and change ports

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use cybervision_core::domain::EntityKind;
use cybervision_core::ports::{
    ICollectionObserver, INotificationService, Notification, OutcomeLevel,
};

use crate::output::OutputFormatter;

/// Prints each outcome through the active output formatter
pub struct ConsoleNotifier {
    formatter: Arc<dyn OutputFormatter>,
    reported_error: AtomicBool,
}

impl ConsoleNotifier {
    pub fn new(formatter: Arc<dyn OutputFormatter>) -> Self {
        Self {
            formatter,
            reported_error: AtomicBool::new(false),
        }
    }

    /// Whether an error outcome has already been shown to the user
    pub fn reported_error(&self) -> bool {
        self.reported_error.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl INotificationService for ConsoleNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        if notification.level == OutcomeLevel::Error {
            self.reported_error.store(true, Ordering::Relaxed);
        }
        self.formatter.notification(notification);
        Ok(())
    }
}

/// Logs collection changes; the CLI has no live views to refresh
pub struct LoggingObserver;

#[async_trait]
impl ICollectionObserver for LoggingObserver {
    async fn collection_changed(&self, kind: EntityKind) {
        debug!(collection = kind.collection(), "Collection changed");
    }
}
