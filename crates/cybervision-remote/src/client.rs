//! Holding backend HTTP client
//!
//! Thin typed wrapper over `reqwest::Client` for the backend's REST
//! collections. Every collection follows the same shape:
//!
//! | Method   | Path            | Body     | Answer           |
//! |----------|-----------------|----------|------------------|
//! | `GET`    | `/{c}`          | -        | JSON array       |
//! | `POST`   | `/{c}`          | record   | stored record    |
//! | `PUT`    | `/{c}/{key}`    | record   | stored record    |
//! | `DELETE` | `/{c}/{key}`    | -        | ignored          |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use cybervision_remote::client::HoldingClient;
//!
//! # async fn example() -> Result<(), cybervision_remote::RemoteError> {
//! let client = HoldingClient::new("http://localhost:8080/api/admin", Duration::from_secs(10))?;
//! let countries = client.list("paises").await?;
//! println!("{} countries", countries.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::RemoteError;

/// Base URL of a locally running backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/admin";

/// HTTP client for the holding backend
pub struct HoldingClient {
    client: Client,
    /// Base URL without a trailing slash
    base_url: String,
}

impl HoldingClient {
    /// Creates a client whose requests time out after `timeout`
    ///
    /// # Errors
    /// Returns `RemoteError::NetworkError` if the TLS backend cannot be
    /// initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client around an existing `reqwest::Client`
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for `path` relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// `GET /{collection}`
    pub async fn list(&self, collection: &str) -> Result<Vec<Value>, RemoteError> {
        let path = format!("/{}", collection);
        debug!(path = %path, "Listing collection");

        let response = self.send(self.request(Method::GET, &path)).await?;
        match read_json(response).await? {
            Value::Array(items) => Ok(items),
            other => Err(RemoteError::InvalidResponse(format!(
                "GET {} returned {} instead of an array",
                path,
                json_type(&other)
            ))),
        }
    }

    /// `POST /{collection}`, returning the stored record
    pub async fn create(&self, collection: &str, record: &Value) -> Result<Value, RemoteError> {
        let path = format!("/{}", collection);
        debug!(path = %path, "Creating record");

        let response = self
            .send(self.request(Method::POST, &path).json(record))
            .await?;
        expect_object(&path, read_json(response).await?)
    }

    /// `PUT /{collection}/{key}`, returning the stored record
    pub async fn update(
        &self,
        collection: &str,
        key: &str,
        record: &Value,
    ) -> Result<Value, RemoteError> {
        let path = format!("/{}/{}", collection, key);
        debug!(path = %path, "Updating record");

        let response = self
            .send(self.request(Method::PUT, &path).json(record))
            .await?;
        expect_object(&path, read_json(response).await?)
    }

    /// `DELETE /{collection}/{key}`; any response body is ignored
    pub async fn delete(&self, collection: &str, key: &str) -> Result<(), RemoteError> {
        let path = format!("/{}/{}", collection, key);
        debug!(path = %path, "Deleting record");

        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    /// Sends a request and turns non-2xx statuses into errors
    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "Backend returned error status");
        Err(RemoteError::from_status(status, &body))
    }
}

async fn read_json(response: Response) -> Result<Value, RemoteError> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| RemoteError::InvalidResponse(format!("malformed JSON body: {}", e)))
}

fn expect_object(path: &str, value: Value) -> Result<Value, RemoteError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(RemoteError::InvalidResponse(format!(
            "{} returned {} instead of a record",
            path,
            json_type(&value)
        )))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
