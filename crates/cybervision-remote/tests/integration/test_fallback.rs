//! Reconciliation over the HTTP gateway
//!
//! The cache side uses the in-memory double from cybervision-core.

use std::sync::Arc;

use serde_json::json;

use cybervision_core::domain::{Company, CompanyId, Country, CountryId, EntityKind};
use cybervision_core::ports::{NoopObserver, OutcomeLevel};
use cybervision_core::testing::{MemoryCache, RecordingNotifier};
use cybervision_core::usecases::{FetchSource, Persistence, ReconciliationService};
use cybervision_remote::HttpRemoteGateway;
use wiremock::MockServer;

use crate::common;

fn service(
    gateway: HttpRemoteGateway,
) -> (ReconciliationService, Arc<MemoryCache>, Arc<RecordingNotifier>) {
    let cache = Arc::new(MemoryCache::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = ReconciliationService::new(
        cache.clone(),
        Arc::new(gateway),
        notifier.clone(),
        Arc::new(NoopObserver),
    );
    (service, cache, notifier)
}

#[tokio::test]
async fn test_backend_record_is_authoritative() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_create(&server, "paises", common::country_json(42, "Chile")).await;
    let (service, cache, notifier) = service(gateway);

    let saved = service
        .save(None, Country::new("chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();

    assert_eq!(saved.persistence, Persistence::Remote);
    assert_eq!(saved.key, CountryId::new(42));
    assert_eq!(saved.entity.name, "Chile");
    assert_eq!(cache.records(EntityKind::Country)[0]["id"], 42);
    assert_eq!(notifier.levels(), vec![OutcomeLevel::Success]);
}

#[tokio::test]
async fn test_rejected_answer_mirrors_submitted_record_under_backend_key() {
    let (server, gateway) = common::setup_backend().await;
    // Nested country shape: parses as an active company without a country
    common::mount_create(
        &server,
        "empresas",
        json!({"id": 9, "nombre": "Andes Tech", "paisSede": {"id": 1}}),
    )
    .await;
    let (service, cache, notifier) = service(gateway);
    cache.seed(EntityKind::Country, vec![common::country_json(1, "Chile")]);

    let saved = service
        .save(None, Company::new("Andes Tech", CountryId::new(1), "Santiago"))
        .await
        .unwrap();

    assert_eq!(saved.persistence, Persistence::Remote);
    assert_eq!(saved.key, CompanyId::new(9));
    assert_eq!(saved.entity.country, Some(CountryId::new(1)));
    let cached = cache.records(EntityKind::Company);
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0]["id"], 9);
    assert_eq!(cached[0]["country"], 1);
    assert_eq!(notifier.levels(), vec![OutcomeLevel::Success]);
}

#[tokio::test]
async fn test_unparsable_answer_with_key_is_still_remote() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_create(&server, "paises", json!({"id": 12, "gdp": "n/a"})).await;
    let (service, cache, _) = service(gateway);

    let saved = service
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();

    assert_eq!(saved.persistence, Persistence::Remote);
    assert_eq!(saved.key, CountryId::new(12));
    assert_eq!(saved.entity.gdp, 500.0);
    assert_eq!(cache.records(EntityKind::Country)[0]["id"], 12);
}

#[tokio::test]
async fn test_answer_without_key_falls_back_to_cache() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_create(&server, "paises", json!({"status": "created"})).await;
    let (service, cache, notifier) = service(gateway);

    let saved = service
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();

    assert_eq!(saved.persistence, Persistence::LocalOnly);
    assert_eq!(saved.key, CountryId::new(1));
    assert_eq!(cache.len(EntityKind::Country), 1);
    assert_eq!(notifier.levels(), vec![OutcomeLevel::Warning]);
}

#[tokio::test]
async fn test_server_error_falls_back_to_cache() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_status(&server, "POST", "/paises", 500).await;
    let (service, cache, notifier) = service(gateway);

    let saved = service
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();

    assert_eq!(saved.persistence, Persistence::LocalOnly);
    assert_eq!(saved.key, CountryId::new(1));
    assert_eq!(cache.len(EntityKind::Country), 1);
    assert_eq!(notifier.levels(), vec![OutcomeLevel::Warning]);
}

#[tokio::test]
async fn test_unreachable_backend_serves_cached_collection() {
    // Start and drop a server so its port is closed
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client =
        cybervision_remote::HoldingClient::new(uri, std::time::Duration::from_millis(300)).unwrap();
    let (service, cache, _) = service(HttpRemoteGateway::new(client));
    cache.seed(
        EntityKind::Country,
        vec![json!({"id": 1, "name": "Chile", "capital": "Santiago"})],
    );

    let fetched = service.fetch_all::<Country>().await.unwrap();

    assert_eq!(fetched.source, FetchSource::Cache);
    assert_eq!(fetched.items.len(), 1);
}

#[tokio::test]
async fn test_fetch_all_mirrors_backend_with_spanish_fields() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_list(
        &server,
        "paises",
        json!([{"id": 3, "nombre": "Argentina", "capital": "Buenos Aires", "pib": 640.0, "habitantes": 46000000}]),
    )
    .await;
    let (service, cache, _) = service(gateway);

    let fetched = service.fetch_all::<Country>().await.unwrap();

    assert_eq!(fetched.source, FetchSource::Remote);
    assert_eq!(fetched.items[0].name, "Argentina");
    assert_eq!(fetched.items[0].gdp, 640.0);
    assert_eq!(cache.records(EntityKind::Country)[0]["name"], "Argentina");
}
