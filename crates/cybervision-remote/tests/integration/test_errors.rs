//! Error mapping for non-2xx and malformed responses

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use cybervision_core::domain::{EntityKind, RecordKey};
use cybervision_core::ports::IRemoteGateway;
use cybervision_remote::{HoldingClient, HttpRemoteGateway, RemoteError};

use crate::common;

fn remote_error(err: &anyhow::Error) -> &RemoteError {
    err.downcast_ref::<RemoteError>()
        .expect("error should wrap a RemoteError")
}

#[tokio::test]
async fn test_update_missing_record_is_not_found() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_status(&server, "PUT", "/paises/9", 404).await;

    let err = gateway
        .update(EntityKind::Country, &RecordKey::Numeric(9), &json!({"name": "X"}))
        .await
        .unwrap_err();

    assert!(matches!(remote_error(&err), RemoteError::NotFound(_)));
    assert!(format!("{:#}", err).contains("country 9"));
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let (server, gateway) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/empresas"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = gateway
        .create(EntityKind::Company, &json!({"name": "Andes"}))
        .await
        .unwrap_err();

    match remote_error(&err) {
        RemoteError::ServerError { status, message } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_rejection_is_client_error() {
    let (server, gateway) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/asesores"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "email"})))
        .mount(&server)
        .await;

    let err = gateway
        .create(EntityKind::Advisor, &json!({"name": "Marta"}))
        .await
        .unwrap_err();

    assert!(matches!(
        remote_error(&err),
        RemoteError::ClientError { status, .. } if status.as_u16() == 400
    ));
}

#[tokio::test]
async fn test_list_that_is_not_an_array_is_invalid() {
    let (server, gateway) = common::setup_backend().await;
    common::mount_list(&server, "paises", json!({"value": []})).await;

    let err = gateway.read_all(EntityKind::Country).await.unwrap_err();
    assert!(matches!(remote_error(&err), RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_malformed_json_is_invalid() {
    let (server, gateway) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/paises"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let err = gateway
        .create(EntityKind::Country, &json!({"name": "Chile"}))
        .await
        .unwrap_err();
    assert!(matches!(remote_error(&err), RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let (server, gateway) = common::setup_backend().await;
    Mock::given(method("GET"))
        .and(path("/paises"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = gateway.read_all(EntityKind::Country).await.unwrap_err();
    assert!(matches!(remote_error(&err), RemoteError::NetworkError(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let client = HoldingClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
    let gateway = HttpRemoteGateway::new(client);

    let err = gateway.read_all(EntityKind::Seller).await.unwrap_err();
    assert!(matches!(remote_error(&err), RemoteError::NetworkError(_)));
}
