//! Flood-risk map client
//!
//! Orchestrates location lookups, historical flood analysis and change
//! detection against the analysis backend, and renders the results as
//! tile overlays on a map surface. Also exposes the geocode proxy routes
//! that keep the provider credential server-side.

pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod map;
pub mod proxy;
pub mod services;
pub mod transport;
pub mod types;

mod test_utils;

// Re-export commonly used types
pub use controller::{ActionKind, ActionOutcome, RequestController};
pub use display::{DisplayField, DisplaySurface, Notice};
pub use error::{ErrorClass, FloodError};
pub use map::{HeadlessMap, LayerManager};
pub use proxy::proxy_routes;
pub use services::ServiceSet;
