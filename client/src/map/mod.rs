//! Map overlay management
//!
//! This module provides:
//! - `MapSurface` trait abstracting the map-rendering engine
//! - `LayerManager` owning the flood/AOI overlay slots and the viewport
//! - `Geometry` / `Bounds` for fitting the viewport to an area of interest
//! - `HeadlessMap`, an in-memory surface for the CLI and tests

mod geometry;
mod headless;
mod layers;
mod surface;

pub use geometry::{Bounds, Geometry};
pub use headless::{HeadlessMap, MapEvent, Viewport};
pub use layers::{LayerManager, LayerSet, SharedLayers};
pub use surface::{LayerHandle, MapSurface, TileOverlay};
