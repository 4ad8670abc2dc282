//! Request/response transport shared by the backend service clients
//!
//! This module provides:
//! - `Transport` trait abstracting the HTTP exchange (JSON in, JSON out)
//! - `HttpTransport` backed by reqwest with an explicit request timeout
//! - `TransportResponse` carrying the status code next to the decoded body

mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;

/// Failures below the application protocol: the exchange itself went wrong
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("server returned {status}")]
    Status { status: u16 },

    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

/// A completed exchange: HTTP status plus the JSON body (`Null` when a
/// non-success response carried no JSON)
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return the body of a 2xx response, or `TransportError::Status`
    pub fn into_success_body(self) -> Result<Value, TransportError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(TransportError::Status {
                status: self.status,
            })
        }
    }
}

/// Query parameters as (name, value) pairs, serialized in order
pub type QueryParams = Vec<(&'static str, String)>;

/// Trait for the request/response layer used by every service client
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with the given query parameters
    async fn get(&self, url: &str, query: &QueryParams) -> Result<TransportResponse, TransportError>;

    /// POST `body` as JSON to `url`
    async fn post_json(&self, url: &str, body: &Value)
    -> Result<TransportResponse, TransportError>;
}
