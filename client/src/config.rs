//! Configuration
//!
//! Loaded from environment variables over built-in defaults. Unparsable
//! values are ignored and the default kept.

use std::env;
use std::time::Duration;

use crate::types::Location;

/// Main configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend endpoints used by the client
    pub endpoints: EndpointConfig,

    /// Rendering choices: zoom levels and overlay opacities
    pub render: RenderConfig,

    /// Geocode proxy (server side only)
    pub proxy: ProxyConfig,
}

/// Where the client sends its requests
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Base URL of the flood analysis backend (`/analyze_flood`, `/detect_flood`)
    pub backend_url: String,
    /// Geocode proxy endpoint. Never the provider itself.
    pub geocode_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Viewport and overlay settings
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    /// Initial map center
    pub initial_center: Location,
    /// Initial zoom level
    pub initial_zoom: u8,
    /// Zoom used when recentering on a geocoded location
    pub location_zoom: u8,
    /// Flood overlay opacity
    pub flood_opacity: f64,
    /// AOI overlay opacity
    pub aoi_opacity: f64,
}

/// Geocode proxy configuration
#[derive(Clone)]
pub struct ProxyConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Geocoding provider endpoint
    pub upstream_url: String,
    /// Provider credential, held only by the proxy
    pub api_key: Option<String>,
}

// Hand-written so the credential never reaches a log line
impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upstream_url", &self.upstream_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            render: RenderConfig::default(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            geocode_url: "http://127.0.0.1:8080/geocode".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            initial_center: Location::new(51.8969, -8.4863), // Cork
            initial_zoom: 10,
            location_zoom: 12,
            flood_opacity: 0.7,
            aoi_opacity: 0.5,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            upstream_url: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // Endpoints
        if let Some(url) = lookup("BACKEND_URL")
            && !url.is_empty()
        {
            config.endpoints.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("GEOCODE_URL")
            && !url.is_empty()
        {
            config.endpoints.geocode_url = url;
        }
        if let Some(val) = lookup("REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
            && secs > 0
        {
            config.endpoints.request_timeout = Duration::from_secs(secs);
        }

        // Rendering
        if let Some(val) = lookup("MAP_CENTER_LAT")
            && let Ok(lat) = val.parse()
        {
            config.render.initial_center.latitude = lat;
        }
        if let Some(val) = lookup("MAP_CENTER_LNG")
            && let Ok(lng) = val.parse()
        {
            config.render.initial_center.longitude = lng;
        }
        if let Some(val) = lookup("MAP_ZOOM")
            && let Ok(zoom) = val.parse()
        {
            config.render.initial_zoom = zoom;
        }
        if let Some(val) = lookup("LOCATION_ZOOM")
            && let Ok(zoom) = val.parse()
        {
            config.render.location_zoom = zoom;
        }
        if let Some(val) = lookup("FLOOD_OPACITY")
            && let Ok(opacity) = val.parse()
        {
            config.render.flood_opacity = opacity;
        }
        if let Some(val) = lookup("AOI_OPACITY")
            && let Ok(opacity) = val.parse()
        {
            config.render.aoi_opacity = opacity;
        }

        // Proxy
        if let Some(host) = lookup("HOST") {
            config.proxy.host = host;
        }
        if let Some(port) = lookup("PORT")
            && let Ok(p) = port.parse()
        {
            config.proxy.port = p;
        }
        if let Some(url) = lookup("GEOCODE_UPSTREAM_URL")
            && !url.is_empty()
        {
            config.proxy.upstream_url = url;
        }
        if let Some(key) = lookup("GEOCODE_API_KEY")
            && !key.is_empty()
        {
            config.proxy.api_key = Some(key);
        }

        config
    }
}
