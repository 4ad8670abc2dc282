//! Geocoding client
//!
//! Talks to the geocode proxy, which holds the provider credential. The
//! response shape is the provider's: `{status, results:[{geometry:{location}}]}`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::GeocodeService;
use crate::error::FloodError;
use crate::transport::Transport;
use crate::types::Location;

/// Provider status sentinel for a successful lookup
pub const GEOCODE_OK: &str = "OK";

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

pub struct HttpGeocodeService {
    transport: Arc<dyn Transport>,
    url: String,
}

impl HttpGeocodeService {
    pub fn new(transport: Arc<dyn Transport>, url: &str) -> Self {
        Self {
            transport,
            url: url.to_string(),
        }
    }

    fn parse(body: Value) -> Result<Location, FloodError> {
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| FloodError::malformed("geocode response has no status"))?;

        if status != GEOCODE_OK {
            return Err(FloodError::GeocodeStatus(status.to_string()));
        }

        let results: Vec<GeocodeResult> = body
            .get("results")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(FloodError::malformed)?
            .unwrap_or_default();

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| FloodError::malformed("geocode response has no results"))?;

        Ok(Location::new(
            first.geometry.location.lat,
            first.geometry.location.lng,
        ))
    }
}

#[async_trait]
impl GeocodeService for HttpGeocodeService {
    async fn lookup(&self, code: &str) -> Result<Location, FloodError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(FloodError::InputValidation(
                "location code must not be empty".to_string(),
            ));
        }

        let response = self
            .transport
            .get(&self.url, &vec![("address", code.to_string())])
            .await?;
        let body = response.into_success_body().inspect_err(|e| {
            warn!("Geocode lookup for {} failed: {}", code, e);
        })?;

        let location = Self::parse(body)?;
        debug!(
            "Geocoded {} to ({}, {})",
            code, location.latitude, location.longitude
        );
        Ok(location)
    }
}
