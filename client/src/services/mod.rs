//! Backend service clients
//!
//! Each service is a trait (so the controller can run against mocks) with an
//! HTTP implementation layered on the shared `Transport`.

mod detection;
mod geocode;
mod history;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::FloodError;
use crate::transport::Transport;
use crate::types::{AnalysisResult, DetectionRequest, DetectionResult, Location};

pub use detection::HttpChangeDetectionService;
pub use geocode::{GEOCODE_OK, HttpGeocodeService};
pub use history::HttpFloodHistoryService;

/// Resolves a location code (e.g. an Eircode) to coordinates
#[async_trait]
pub trait GeocodeService: Send + Sync {
    async fn lookup(&self, code: &str) -> Result<Location, FloodError>;
}

/// Historical flood analysis for a named area
#[async_trait]
pub trait FloodHistoryService: Send + Sync {
    async fn analyze(&self, city: &str) -> Result<AnalysisResult, FloodError>;
}

/// Pre/post-event change detection
#[async_trait]
pub trait ChangeDetectionService: Send + Sync {
    /// A non-success status comes back as `Ok` with that status
    async fn detect(&self, request: &DetectionRequest) -> Result<DetectionResult, FloodError>;
}

/// The three services the controller dispatches to
#[derive(Clone)]
pub struct ServiceSet {
    pub geocoder: Arc<dyn GeocodeService>,
    pub history: Arc<dyn FloodHistoryService>,
    pub detection: Arc<dyn ChangeDetectionService>,
}

impl ServiceSet {
    /// HTTP clients for the configured endpoints, sharing one transport
    pub fn http(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            geocoder: Arc::new(HttpGeocodeService::new(
                transport.clone(),
                &config.endpoints.geocode_url,
            )),
            history: Arc::new(HttpFloodHistoryService::new(
                transport.clone(),
                &config.endpoints.backend_url,
            )),
            detection: Arc::new(HttpChangeDetectionService::new(
                transport,
                &config.endpoints.backend_url,
            )),
        }
    }
}
