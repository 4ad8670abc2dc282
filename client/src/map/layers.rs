//! Overlay lifecycle on top of a `MapSurface`
//!
//! `LayerManager` is the map context: it owns the map handle and the
//! `LayerSet`, and is the only thing allowed to install or remove overlays.
//! At most one flood overlay and one AOI overlay are live at any time.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::geometry::{Bounds, Geometry};
use super::surface::{LayerHandle, MapSurface, TileOverlay};
use crate::error::FloodError;
use crate::types::Location;

/// The two overlay slots tracked by the manager
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LayerSet {
    pub flood: Option<LayerHandle>,
    pub aoi: Option<LayerHandle>,
}

impl LayerSet {
    pub fn is_empty(&self) -> bool {
        self.flood.is_none() && self.aoi.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Flood,
    Aoi,
}

/// Layer manager shared between concurrently running actions
pub type SharedLayers<M> = Arc<Mutex<LayerManager<M>>>;

pub struct LayerManager<M: MapSurface> {
    map: M,
    layers: LayerSet,
}

impl<M: MapSurface> LayerManager<M> {
    pub fn new(map: M) -> Self {
        Self {
            map,
            layers: LayerSet::default(),
        }
    }

    pub fn shared(map: M) -> SharedLayers<M> {
        Arc::new(Mutex::new(Self::new(map)))
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn layers(&self) -> LayerSet {
        self.layers
    }

    /// Apply the initial viewport
    pub fn initialize(&mut self, center: Location, zoom: u8) {
        self.map.set_view(center, zoom);
    }

    /// Replace the flood overlay
    pub fn set_flood_layer(&mut self, url_template: &str, opacity: f64) -> LayerHandle {
        self.replace(Slot::Flood, TileOverlay::new(url_template, opacity))
    }

    /// Replace the AOI overlay
    pub fn set_aoi_layer(&mut self, url_template: &str, opacity: f64) -> LayerHandle {
        self.replace(Slot::Aoi, TileOverlay::new(url_template, opacity))
    }

    /// Remove both overlays; a no-op when nothing is installed
    pub fn clear_all(&mut self) {
        if let Some(handle) = self.layers.flood.take() {
            self.map.remove_layer(handle);
        }
        if let Some(handle) = self.layers.aoi.take() {
            self.map.remove_layer(handle);
        }
    }

    /// Clear everything, then install a flood + AOI pair
    pub fn install_pair(
        &mut self,
        flood: &str,
        flood_opacity: f64,
        aoi: &str,
        aoi_opacity: f64,
    ) -> LayerSet {
        self.clear_all();
        self.set_flood_layer(flood, flood_opacity);
        self.set_aoi_layer(aoi, aoi_opacity);
        self.layers
    }

    /// Fit the viewport to the geometry's bounding box. Leaves `LayerSet` alone.
    pub fn fit_to_geometry(&mut self, geometry: &Geometry) -> Result<Bounds, FloodError> {
        let bounds = geometry.bounds().ok_or_else(|| {
            FloodError::MalformedResponse("geometry has no coordinates".to_string())
        })?;
        self.map.fit_bounds(bounds);
        Ok(bounds)
    }

    /// Move the viewport to a location. Leaves `LayerSet` alone.
    pub fn recenter(&mut self, location: Location, zoom: u8) {
        self.map.set_view(location, zoom);
    }

    fn replace(&mut self, slot: Slot, overlay: TileOverlay) -> LayerHandle {
        let current = match slot {
            Slot::Flood => &mut self.layers.flood,
            Slot::Aoi => &mut self.layers.aoi,
        };
        if let Some(previous) = current.take() {
            self.map.remove_layer(previous);
        }
        let handle = self.map.add_tile_layer(&overlay);
        debug!("{:?} overlay is now {:?}", slot, handle);
        *current = Some(handle);
        handle
    }
}
