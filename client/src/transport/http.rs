//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{QueryParams, Transport, TransportError, TransportResponse};

/// HTTP transport with a finite per-request timeout
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<TransportResponse, TransportError> {
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Ok(TransportResponse::new(status.as_u16(), body)),
            // Error pages are often HTML; keep the status and let the caller decide
            Err(_) if !status.is_success() => Ok(TransportResponse::new(status.as_u16(), Value::Null)),
            Err(e) => Err(TransportError::Decode(e.to_string())),
        }
    }
}

/// The URL is stripped: its query string may carry a credential
fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    let e = e.without_url();
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &QueryParams) -> Result<TransportResponse, TransportError> {
        debug!("GET {} ({} params)", url, query.len());
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read(response).await
    }
}
