//! Flood history client (`POST /analyze_flood`)

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::FloodHistoryService;
use crate::error::{FloodError, UNKNOWN_ANALYSIS_ERROR};
use crate::map::Geometry;
use crate::transport::{Transport, TransportError};
use crate::types::AnalysisResult;

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    city: String,
    year: i32,
    flood_percentage: f64,
    #[serde(deserialize_with = "flooded_flag")]
    was_flooded: bool,
    #[serde(default)]
    historical_note: String,
    aoi: Value,
    map_tiles: MapTiles,
}

#[derive(Debug, Deserialize)]
struct MapTiles {
    flood: String,
    aoi: String,
}

/// `was_flooded` arrives either as a boolean or as "YES"/"NO"
fn flooded_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) if s.eq_ignore_ascii_case("yes") => Ok(true),
        Flag::Text(s) if s.eq_ignore_ascii_case("no") => Ok(false),
        Flag::Text(s) => Err(serde::de::Error::custom(format!(
            "was_flooded must be a boolean or YES/NO, got {s:?}"
        ))),
    }
}

impl TryFrom<AnalysisPayload> for AnalysisResult {
    type Error = FloodError;

    fn try_from(p: AnalysisPayload) -> Result<Self, FloodError> {
        Ok(Self {
            city: p.city,
            year: p.year,
            flood_percentage: p.flood_percentage,
            was_flooded: p.was_flooded,
            historical_note: p.historical_note,
            aoi: Geometry::from_geojson(p.aoi)?,
            flood_tile_url_template: p.map_tiles.flood,
            aoi_tile_url_template: p.map_tiles.aoi,
        })
    }
}

pub struct HttpFloodHistoryService {
    transport: Arc<dyn Transport>,
    url: String,
}

impl HttpFloodHistoryService {
    pub fn new(transport: Arc<dyn Transport>, backend_url: &str) -> Self {
        Self {
            transport,
            url: format!("{}/analyze_flood", backend_url.trim_end_matches('/')),
        }
    }

    /// Interpret the `{success, ...}` envelope.
    ///
    /// The backend answers failures with HTTP 500 and `{success:false, error}`,
    /// so the envelope wins over the status code whenever it is present.
    fn parse(status: u16, body: Value) -> Result<AnalysisResult, FloodError> {
        match body.get("success").and_then(Value::as_bool) {
            Some(false) => {
                let message = body
                    .get("error")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(UNKNOWN_ANALYSIS_ERROR);
                Err(FloodError::Analysis(message.to_string()))
            }
            Some(true) if (200..300).contains(&status) => {
                let payload: AnalysisPayload =
                    serde_json::from_value(body).map_err(FloodError::malformed)?;
                payload.try_into()
            }
            _ if !(200..300).contains(&status) => {
                Err(FloodError::Transport(TransportError::Status { status }))
            }
            _ => Err(FloodError::malformed("analysis response has no success flag")),
        }
    }
}

#[async_trait]
impl FloodHistoryService for HttpFloodHistoryService {
    async fn analyze(&self, city: &str) -> Result<AnalysisResult, FloodError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(FloodError::InputValidation(
                "city must not be empty".to_string(),
            ));
        }

        let response = self
            .transport
            .post_json(&self.url, &json!({ "city": city }))
            .await?;

        let result = Self::parse(response.status, response.body).inspect_err(|e| {
            warn!("Flood analysis for {} failed: {}", city, e);
        })?;

        info!(
            "Flood analysis for {}: {}% flooded in {}",
            result.city, result.flood_percentage, result.year
        );
        Ok(result)
    }
}
