//! Area-of-interest geometry and bounding boxes

use geo::{BoundingRect, GeometryCollection, Rect};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FloodError;

/// Axis-aligned lat/lng bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            south: rect.min().y,
            west: rect.min().x,
            north: rect.max().y,
            east: rect.max().x,
        }
    }
}

/// An area-of-interest geometry as returned by the analysis backend.
///
/// Any GeoJSON object is accepted: a bare geometry, a `Feature` or a
/// `FeatureCollection`. Everything is flattened into one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry(GeometryCollection<f64>);

impl Geometry {
    /// Parse a GeoJSON value
    pub fn from_geojson(value: Value) -> Result<Self, FloodError> {
        let geojson = GeoJson::from_json_value(value).map_err(FloodError::malformed)?;
        let collection = geojson::quick_collection(&geojson).map_err(FloodError::malformed)?;
        Ok(Self(collection))
    }

    pub fn as_geo(&self) -> &GeometryCollection<f64> {
        &self.0
    }

    /// Bounding box over every coordinate, or `None` if there are none
    pub fn bounds(&self) -> Option<Bounds> {
        self.0.bounding_rect().map(Bounds::from)
    }
}

impl From<geo::Geometry<f64>> for Geometry {
    fn from(geometry: geo::Geometry<f64>) -> Self {
        Self(GeometryCollection::from(vec![geometry]))
    }
}
