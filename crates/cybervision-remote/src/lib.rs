//! CyberVision Remote - REST client for the holding backend
//!
//! Provides:
//! - [`client`] - HTTP client for the `/api/admin` REST collections
//! - [`gateway`] - `IRemoteGateway` adapters (HTTP and always-offline)
//!
//! The backend is authoritative: records it returns replace the cached copy.
//! Every failure here surfaces to the core as an `anyhow::Error`, which the
//! reconciliation service treats as "backend unavailable".

pub mod client;
pub mod gateway;

pub use client::HoldingClient;
pub use gateway::{HttpRemoteGateway, OfflineGateway};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the holding backend
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The requested record or collection does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the request (4xx other than 404)
    #[error("Request rejected with {status}: {message}")]
    ClientError {
        status: StatusCode,
        message: String,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error {status}: {message}")]
    ServerError {
        status: StatusCode,
        message: String,
    },

    /// A network-level error occurred (refused, timed out, reset)
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response body could not be parsed or had the wrong shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Remote access is disabled in configuration
    #[error("Remote backend disabled")]
    Offline,
}

impl RemoteError {
    /// Maps a non-success HTTP status and its body to an error
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string()
        } else {
            body.trim().to_string()
        };

        if status == StatusCode::NOT_FOUND {
            RemoteError::NotFound(message)
        } else if status.is_server_error() {
            RemoteError::ServerError { status, message }
        } else {
            RemoteError::ClientError { status, message }
        }
    }
}
