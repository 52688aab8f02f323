//! CRUD round trips against the mocked backend

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use cybervision_core::domain::{EntityKind, RecordKey};
use cybervision_core::ports::IRemoteGateway;

use crate::common;

// ============================================================================
// read_all
// ============================================================================

#[tokio::test]
async fn test_read_all_returns_records() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_list(
        &server,
        "paises",
        json!([common::country_json(1, "Chile"), common::country_json(2, "Peru")]),
    )
    .await;

    let records = gateway
        .read_all(EntityKind::Country)
        .await
        .expect("read_all failed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["name"], "Peru");
}

#[tokio::test]
async fn test_read_all_market_areas_uses_hyphenated_path() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_list(
        &server,
        "areas-mercado",
        json!([{"id": 1, "name": "Retail", "description": ""}]),
    )
    .await;

    let records = gateway.read_all(EntityKind::MarketArea).await.unwrap();
    assert_eq!(records.len(), 1);
}

// ============================================================================
// create / update / delete
// ============================================================================

#[tokio::test]
async fn test_create_posts_record_and_returns_stored_copy() {
    let (server, gateway) = common::setup_backend().await;
    let sent = json!({"name": "Chile", "capital": "Santiago"});
    Mock::given(method("POST"))
        .and(path("/paises"))
        .and(body_json(&sent))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::country_json(7, "Chile")))
        .expect(1)
        .mount(&server)
        .await;

    let stored = gateway.create(EntityKind::Country, &sent).await.unwrap();

    assert_eq!(stored["id"], 7);
}

#[tokio::test]
async fn test_update_puts_to_keyed_path() {
    let (server, gateway) = common::setup_backend().await;
    let record = json!({"code": "V002", "name": "Luis", "company": 1});
    Mock::given(method("PUT"))
        .and(path("/vendedores/V002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&record))
        .expect(1)
        .mount(&server)
        .await;

    let stored = gateway
        .update(EntityKind::Seller, &RecordKey::Code("V002".into()), &record)
        .await
        .unwrap();

    assert_eq!(stored["code"], "V002");
}

#[tokio::test]
async fn test_delete_accepts_message_body() {
    let (server, gateway) = common::setup_backend().await;
    Mock::given(method("DELETE"))
        .and(path("/empresas/3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"mensaje": "Empresa eliminada exitosamente"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    gateway
        .delete(EntityKind::Company, &RecordKey::Numeric(3))
        .await
        .expect("delete failed");
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_status(&server, "DELETE", "/paises/1", 200).await;

    gateway
        .delete(EntityKind::Country, &RecordKey::Numeric(1))
        .await
        .expect("delete failed");
}
