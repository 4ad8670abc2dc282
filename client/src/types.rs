//! Value types exchanged between the services, the layer manager and the display

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FloodError;
use crate::map::Geometry;
use crate::transport::QueryParams;

/// Date format for change-detection query parameters
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Status sentinel of a successful change-detection run
pub const DETECTION_SUCCESS: &str = "success";

/// Geographic coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Historical flood analysis for one area
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub city: String,
    pub year: i32,
    pub flood_percentage: f64,
    pub was_flooded: bool,
    pub historical_note: String,
    pub aoi: Geometry,
    pub flood_tile_url_template: String,
    pub aoi_tile_url_template: String,
}

/// Input to a pre/post-event change detection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRequest {
    pub city: String,
    pub pre_event_start: NaiveDate,
    pub pre_event_end: NaiveDate,
    pub post_event_start: NaiveDate,
    pub post_event_end: NaiveDate,
}

impl DetectionRequest {
    /// Reject an empty city or a window whose start is after its end
    pub fn validate(&self) -> Result<(), FloodError> {
        if self.city.trim().is_empty() {
            return Err(FloodError::InputValidation(
                "city must not be empty".to_string(),
            ));
        }
        if self.pre_event_start > self.pre_event_end {
            return Err(FloodError::InputValidation(format!(
                "pre-event window starts after it ends ({} > {})",
                self.pre_event_start, self.pre_event_end
            )));
        }
        if self.post_event_start > self.post_event_end {
            return Err(FloodError::InputValidation(format!(
                "post-event window starts after it ends ({} > {})",
                self.post_event_start, self.post_event_end
            )));
        }
        Ok(())
    }

    pub fn to_query(&self) -> QueryParams {
        vec![
            ("city", self.city.trim().to_string()),
            ("pre_flood_start", self.pre_event_start.format(DATE_FORMAT).to_string()),
            ("pre_flood_end", self.pre_event_end.format(DATE_FORMAT).to_string()),
            ("post_flood_start", self.post_event_start.format(DATE_FORMAT).to_string()),
            ("post_flood_end", self.post_event_end.format(DATE_FORMAT).to_string()),
        ]
    }
}

/// Change detection outcome. A non-success status is ordinary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub status: String,
    pub map_tile_url: Option<String>,
}

impl DetectionResult {
    pub fn is_success(&self) -> bool {
        self.status == DETECTION_SUCCESS
    }
}
