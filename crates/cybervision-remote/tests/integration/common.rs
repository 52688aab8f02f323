//! Shared test helpers for holding backend integration tests
//!
//! Each helper mounts mock endpoints on a wiremock server; `setup_backend`
//! returns a gateway pointing at it.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cybervision_remote::{HoldingClient, HttpRemoteGateway};

/// Starts a mock server and returns a gateway with a short timeout
pub async fn setup_backend() -> (MockServer, HttpRemoteGateway) {
    let server = MockServer::start().await;
    let client = HoldingClient::new(server.uri(), Duration::from_millis(500))
        .expect("Failed to build client");
    (server, HttpRemoteGateway::new(client))
}

/// Country record as the backend stores it
pub fn country_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "capital": "Santiago",
        "gdp": 500.0,
        "population": 19_000_000_u64
    })
}

/// Mounts `GET /{collection}` returning `items`
pub async fn mount_list(server: &MockServer, collection: &str, items: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", collection)))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(server)
        .await;
}

/// Mounts `POST /{collection}` answering with `stored`
pub async fn mount_create(server: &MockServer, collection: &str, stored: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/{}", collection)))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored))
        .mount(server)
        .await;
}

/// Mounts any method on `route` answering with a bare status
#[allow(dead_code)]
pub async fn mount_status(server: &MockServer, http_method: &str, route: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
