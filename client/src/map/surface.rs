//! MapSurface trait: the seam to the map-rendering engine

use serde::{Deserialize, Serialize};

use super::geometry::Bounds;
use crate::types::Location;

/// Opaque reference to a layer installed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerHandle(pub u64);

/// A raster tile overlay addressed by a `{z}/{x}/{y}` URL template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileOverlay {
    pub url_template: String,
    pub opacity: f64,
}

impl TileOverlay {
    pub fn new(url_template: impl Into<String>, opacity: f64) -> Self {
        Self {
            url_template: url_template.into(),
            opacity: opacity.clamp(0.0, 1.0),
        }
    }
}

/// Operations the orchestrator needs from a map engine.
///
/// Tile fetching, panning and zooming stay inside the engine; this trait only
/// installs/removes overlays and moves the viewport.
pub trait MapSurface: Send {
    fn add_tile_layer(&mut self, overlay: &TileOverlay) -> LayerHandle;

    fn remove_layer(&mut self, handle: LayerHandle);

    fn set_view(&mut self, center: Location, zoom: u8);

    fn fit_bounds(&mut self, bounds: Bounds);
}
