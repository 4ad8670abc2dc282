//! HTTP route handlers for the geocode proxy

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ProxyConfig;
use crate::transport::{QueryParams, Transport, TransportError};

/// Proxy state: the upstream transport plus the provider credential
#[derive(Clone)]
pub struct ProxyState {
    pub transport: Arc<dyn Transport>,
    pub upstream_url: String,
    api_key: Option<Arc<str>>,
}

impl ProxyState {
    pub fn new(transport: Arc<dyn Transport>, config: &ProxyConfig) -> Self {
        Self {
            transport,
            upstream_url: config.upstream_url.clone(),
            api_key: config.api_key.as_deref().map(Arc::from),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("address must not be empty")]
    InvalidAddress,

    #[error("geocoding credential is not configured")]
    NotConfigured,

    #[error("upstream geocoder failed: {0}")]
    Upstream(#[from] TransportError),
}

/// Error response for the proxy API
#[derive(Debug, Serialize)]
pub struct ProxyErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<ProxyError> for ProxyErrorResponse {
    fn from(e: ProxyError) -> Self {
        // Upstream failures get a fixed message: transport text may echo the
        // upstream request, credential included
        let (code, error) = match &e {
            ProxyError::InvalidAddress => ("invalid_address", e.to_string()),
            ProxyError::NotConfigured => ("not_configured", e.to_string()),
            ProxyError::Upstream(TransportError::Timeout(_)) => {
                ("upstream_timeout", "upstream geocoder timed out".to_string())
            }
            ProxyError::Upstream(TransportError::Status { status }) => (
                "upstream_error",
                format!("upstream geocoder returned {status}"),
            ),
            ProxyError::Upstream(_) => ("upstream_error", "upstream geocoder failed".to_string()),
        };
        Self {
            error,
            code: code.to_string(),
        }
    }
}

impl IntoResponse for ProxyErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "invalid_address" => StatusCode::BAD_REQUEST,
            "not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            "upstream_timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    geocoder: &'static str,
}

/// GET /geocode?address=... - Forward a lookup to the provider
///
/// The provider's JSON body is passed through untouched so the client sees
/// the provider `status` field.
pub async fn geocode(
    State(state): State<ProxyState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Value>, ProxyErrorResponse> {
    let result = forward(&state, query.address.as_deref().unwrap_or("")).await;

    let outcome = match &result {
        Ok(_) => "forwarded",
        Err(ProxyError::InvalidAddress) => "invalid",
        Err(ProxyError::NotConfigured) => "not_configured",
        Err(ProxyError::Upstream(_)) => "upstream_error",
    };
    counter!("floodrisk_proxy_requests_total", "outcome" => outcome).increment(1);

    result.map(Json).map_err(ProxyErrorResponse::from)
}

async fn forward(state: &ProxyState, address: &str) -> Result<Value, ProxyError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ProxyError::InvalidAddress);
    }
    let key = state.api_key.as_deref().ok_or(ProxyError::NotConfigured)?;

    debug!("Forwarding geocode lookup for {}", address);
    let query: QueryParams = vec![("address", address.to_string()), ("key", key.to_string())];
    let response = state
        .transport
        .get(&state.upstream_url, &query)
        .await
        .inspect_err(|e| warn!("Geocode upstream request failed: {}", e))?;

    Ok(response.into_success_body().inspect_err(|e| {
        warn!("Geocode upstream answered with an error: {}", e);
    })?)
}

/// GET /health
pub async fn health(State(state): State<ProxyState>) -> (StatusCode, Json<HealthResponse>) {
    let configured = state.is_configured();
    let status = if configured {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if configured { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            geocoder: if configured { "configured" } else { "not_configured" },
        }),
    )
}

/// Create the proxy router
pub fn proxy_routes(state: ProxyState) -> Router {
    Router::new()
        .route("/geocode", get(geocode))
        .route("/health", get(health))
        .with_state(state)
}
