//! Application wiring: builds the adapters and services a command needs

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use cybervision_cache::{DatabasePool, SqliteLocalCache};
use cybervision_core::config::Config;
use cybervision_core::ports::{ICollectionObserver, ILocalCache, INotificationService, IRemoteGateway};
use cybervision_core::usecases::{ReconciliationService, ReportUseCase};
use cybervision_integrity::{IntegrityManager, PolicyPreset, RecruitmentService};
use cybervision_remote::{HoldingClient, HttpRemoteGateway, OfflineGateway};

use crate::notifier::{ConsoleNotifier, LoggingObserver};
use crate::output::OutputFormatter;

/// Everything a command can reach, built once per invocation
pub struct AppContext {
    pub cache: Arc<SqliteLocalCache>,
    pub reconciler: Arc<ReconciliationService>,
    pub integrity: IntegrityManager,
    pub recruitment: RecruitmentService,
    pub report: ReportUseCase,
    pub country_policy: PolicyPreset,
    pub notifier: Arc<ConsoleNotifier>,
    pub formatter: Arc<dyn OutputFormatter>,
    /// False when writes can only reach the local cache
    pub online: bool,
}

impl AppContext {
    /// Opens the local cache and connects the backend client
    ///
    /// `offline` forces the local-fallback path even when the backend is
    /// enabled in the configuration.
    pub async fn open(
        config: &Config,
        offline: bool,
        formatter: Arc<dyn OutputFormatter>,
    ) -> Result<Self> {
        let pool = DatabasePool::new(&config.cache.path)
            .await
            .with_context(|| {
                format!("Failed to open local cache at {}", config.cache.path.display())
            })?;
        let cache = Arc::new(SqliteLocalCache::new(pool.pool().clone()));
        debug!(path = %config.cache.path.display(), "Local cache opened");

        let online = config.remote.enabled && !offline;
        let remote: Arc<dyn IRemoteGateway> = if online {
            let client = HoldingClient::new(
                config.remote.base_url.clone(),
                Duration::from_secs(config.remote.timeout_secs),
            )
            .context("Failed to build backend client")?;
            info!(base_url = %config.remote.base_url, "Using holding backend");
            Arc::new(HttpRemoteGateway::new(client))
        } else {
            info!("Backend disabled, changes are kept in the local cache only");
            Arc::new(OfflineGateway)
        };

        Ok(Self::assemble(cache, remote, formatter, online, config))
    }

    fn assemble(
        cache: Arc<SqliteLocalCache>,
        remote: Arc<dyn IRemoteGateway>,
        formatter: Arc<dyn OutputFormatter>,
        online: bool,
        config: &Config,
    ) -> Self {
        let notifier = Arc::new(ConsoleNotifier::new(formatter.clone()));
        let local: Arc<dyn ILocalCache> = cache.clone();
        let reconciler = Arc::new(ReconciliationService::new(
            local.clone(),
            remote,
            notifier.clone() as Arc<dyn INotificationService>,
            Arc::new(LoggingObserver) as Arc<dyn ICollectionObserver>,
        ));

        Self {
            integrity: IntegrityManager::new(reconciler.clone()),
            recruitment: RecruitmentService::new(reconciler.clone()),
            report: ReportUseCase::new(local),
            country_policy: PolicyPreset::from_config(&config.integrity.default_country_policy),
            cache,
            reconciler,
            notifier,
            formatter,
            online,
        }
    }
}
