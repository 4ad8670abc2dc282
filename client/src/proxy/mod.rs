//! Geocode proxy
//!
//! Server-side route that forwards location lookups to the geocoding
//! provider. The provider credential lives only here; clients call the
//! proxy without one.

pub mod routes;

pub use routes::{ProxyError, ProxyErrorResponse, ProxyState, proxy_routes};
