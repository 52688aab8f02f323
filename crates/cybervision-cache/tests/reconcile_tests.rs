//! ReconciliationService running on top of the SQLite cache
//!
//! The remote side is the scripted in-memory gateway from cybervision-core.

use std::sync::Arc;

use cybervision_cache::{DatabasePool, SqliteLocalCache};
use cybervision_core::domain::{Company, Country, CountryId, EntityKind, Seller, SellerCode};
use cybervision_core::ports::ILocalCache;
use cybervision_core::testing::{RecordingNotifier, RecordingObserver, ScriptedGateway};
use cybervision_core::usecases::{Persistence, ReconciliationService};

struct Harness {
    service: ReconciliationService,
    cache: Arc<SqliteLocalCache>,
    gateway: Arc<ScriptedGateway>,
}

async fn harness(online: bool) -> Harness {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let cache = Arc::new(SqliteLocalCache::new(pool.pool().clone()));
    let gateway = Arc::new(ScriptedGateway::new(online));
    let service = ReconciliationService::new(
        cache.clone(),
        gateway.clone(),
        Arc::new(RecordingNotifier::new()),
        Arc::new(RecordingObserver::new()),
    );
    Harness {
        service,
        cache,
        gateway,
    }
}

#[tokio::test]
async fn test_remote_save_is_mirrored_to_sqlite() {
    let h = harness(true).await;

    let saved = h
        .service
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();

    assert_eq!(saved.persistence, Persistence::Remote);
    assert_eq!(saved.key, CountryId::new(1));
    let cached = h.cache.get_all(EntityKind::Country).await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0]["name"], "Chile");
}

#[tokio::test]
async fn test_offline_save_lands_in_sqlite_with_next_key() {
    let h = harness(false).await;

    let first = h
        .service
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();
    let second = h
        .service
        .save(None, Country::new("Peru", "Lima", 240.0, 33_000_000))
        .await
        .unwrap();

    assert_eq!(first.persistence, Persistence::LocalOnly);
    assert_eq!(second.key, CountryId::new(2));

    let fetched: Country = h.service.get(&second.key).await.unwrap();
    assert_eq!(fetched.name, "Peru");
    assert_eq!(fetched.id, Some(CountryId::new(2)));
}

#[tokio::test]
async fn test_seller_codes_and_levels_survive_storage() {
    let h = harness(false).await;
    let chile = h
        .service
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();
    let company = h
        .service
        .save(None, Company::new("Andes Retail", chile.key, "Santiago"))
        .await
        .unwrap();

    let root = h
        .service
        .save(None, Seller::new("Ana", company.key))
        .await
        .unwrap();
    let recruit = h
        .service
        .save(None, Seller::new("Luis", company.key).recruited_by(root.key.clone()))
        .await
        .unwrap();

    assert_eq!(root.key, SellerCode::new("V001").unwrap());
    assert_eq!(recruit.key, SellerCode::new("V002").unwrap());

    let stored: Seller = h.service.get(&recruit.key).await.unwrap();
    assert_eq!(stored.level, 2);
    assert_eq!(stored.recruiter, Some(root.key));
}

#[tokio::test]
async fn test_fetch_all_replaces_sqlite_collection() {
    let h = harness(true).await;
    h.cache
        .replace_all(
            EntityKind::Country,
            vec![serde_json::json!({"id": 9, "name": "Stale"})],
        )
        .await
        .unwrap();
    h.gateway.seed(
        EntityKind::Country,
        vec![serde_json::json!({"id": 1, "name": "Chile", "capital": "Santiago"})],
    );

    let fetched = h.service.fetch_all::<Country>().await.unwrap();

    assert_eq!(fetched.items.len(), 1);
    let cached = h.cache.get_all(EntityKind::Country).await.unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0]["id"], 1);
}

#[tokio::test]
async fn test_delete_removes_row_even_when_offline() {
    let h = harness(true).await;
    let saved = h
        .service
        .save(None, Country::new("Chile", "Santiago", 500.0, 19_000_000))
        .await
        .unwrap();

    h.gateway.set_online(false);
    let deleted = h.service.delete::<Country>(&saved.key).await.unwrap();

    assert!(deleted.removed);
    assert_eq!(deleted.persistence, Persistence::LocalOnly);
    assert!(h.cache.get_all(EntityKind::Country).await.unwrap().is_empty());
}
