//! In-memory map surface
//!
//! Keeps the live layer set and viewport in memory and records every
//! operation. Used by the CLI (which has no rendering engine) and by tests.

use std::collections::BTreeMap;

use tracing::debug;

use super::geometry::Bounds;
use super::surface::{LayerHandle, MapSurface, TileOverlay};
use crate::types::Location;

/// One operation applied to the map, in order
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    LayerAdded {
        handle: LayerHandle,
        overlay: TileOverlay,
    },
    LayerRemoved(LayerHandle),
    ViewSet {
        center: Location,
        zoom: u8,
    },
    BoundsFitted(Bounds),
}

/// Current viewport of a headless map
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    Centered { center: Location, zoom: u8 },
    Fitted(Bounds),
}

#[derive(Debug, Default)]
pub struct HeadlessMap {
    next_handle: u64,
    live: BTreeMap<LayerHandle, TileOverlay>,
    viewport: Option<Viewport>,
    events: Vec<MapEvent>,
    peak_live: usize,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_layers(&self) -> &BTreeMap<LayerHandle, TileOverlay> {
        &self.live
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn events(&self) -> &[MapEvent] {
        &self.events
    }

    /// Highest number of simultaneously live layers ever observed
    pub fn peak_live(&self) -> usize {
        self.peak_live
    }
}

impl MapSurface for HeadlessMap {
    fn add_tile_layer(&mut self, overlay: &TileOverlay) -> LayerHandle {
        self.next_handle += 1;
        let handle = LayerHandle(self.next_handle);
        self.live.insert(handle, overlay.clone());
        self.peak_live = self.peak_live.max(self.live.len());
        self.events.push(MapEvent::LayerAdded {
            handle,
            overlay: overlay.clone(),
        });
        debug!(
            "Added layer {:?} ({}, opacity {})",
            handle, overlay.url_template, overlay.opacity
        );
        handle
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        if self.live.remove(&handle).is_some() {
            self.events.push(MapEvent::LayerRemoved(handle));
            debug!("Removed layer {:?}", handle);
        }
    }

    fn set_view(&mut self, center: Location, zoom: u8) {
        self.viewport = Some(Viewport::Centered { center, zoom });
        self.events.push(MapEvent::ViewSet { center, zoom });
        debug!(
            "View set to ({}, {}) zoom {}",
            center.latitude, center.longitude, zoom
        );
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        self.viewport = Some(Viewport::Fitted(bounds));
        self.events.push(MapEvent::BoundsFitted(bounds));
        debug!("Fitted bounds {:?}", bounds);
    }
}
