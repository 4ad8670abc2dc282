//! Change detection client (`GET /detect_flood`)

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::ChangeDetectionService;
use crate::error::FloodError;
use crate::transport::Transport;
use crate::types::{DetectionRequest, DetectionResult};

#[derive(Debug, Deserialize)]
struct DetectionPayload {
    status: String,
    #[serde(default)]
    map_url: Option<String>,
}

pub struct HttpChangeDetectionService {
    transport: Arc<dyn Transport>,
    url: String,
}

impl HttpChangeDetectionService {
    pub fn new(transport: Arc<dyn Transport>, backend_url: &str) -> Self {
        Self {
            transport,
            url: format!("{}/detect_flood", backend_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ChangeDetectionService for HttpChangeDetectionService {
    async fn detect(&self, request: &DetectionRequest) -> Result<DetectionResult, FloodError> {
        request.validate()?;

        let response = self.transport.get(&self.url, &request.to_query()).await?;
        let body = response.into_success_body()?;
        let payload: DetectionPayload =
            serde_json::from_value(body).map_err(FloodError::malformed)?;

        let result = DetectionResult {
            status: payload.status,
            map_tile_url: payload.map_url.filter(|u| !u.is_empty()),
        };

        if !result.is_success() {
            warn!(
                "Change detection for {} reported status {}",
                request.city, result.status
            );
            return Ok(result);
        }
        if result.map_tile_url.is_none() {
            return Err(FloodError::malformed("successful detection has no map_url"));
        }

        info!("Change detection for {} produced an overlay", request.city);
        Ok(result)
    }
}
