//! Common Test Utilities for Integration Tests
//!
//! A stub transport behind the real HTTP services, a recording display and
//! a harness wiring them to a `RequestController` over a `HeadlessMap`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use floodrisk_client::config::Config;
use floodrisk_client::display::{DisplayField, DisplaySurface, Notice};
use floodrisk_client::map::{HeadlessMap, LayerManager, SharedLayers};
use floodrisk_client::services::ServiceSet;
use floodrisk_client::transport::{QueryParams, Transport, TransportError, TransportResponse};
use floodrisk_client::RequestController;
use serde_json::{Value, json};
use tokio::sync::oneshot;

// ============================================================================
// Stub Transport
// ============================================================================

struct Reply {
    /// Substring that must appear in the request (URL, query or body)
    needle: String,
    response: Result<TransportResponse, TransportError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Transport answering from a list of canned replies.
///
/// Each request takes the first reply whose needle it contains. A gated
/// reply is held back until its sender fires, which lets a test force
/// responses to arrive out of order.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<Vec<Reply>>,
    calls: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: u16, body: Value) {
        self.reply_for("", status, body);
    }

    pub fn reply_for(&self, needle: &str, status: u16, body: Value) {
        self.push(needle, Ok(TransportResponse::new(status, body)), None);
    }

    pub fn fail(&self, error: TransportError) {
        self.push("", Err(error), None);
    }

    /// Queue a reply that is only delivered once the returned sender fires
    pub fn gated_reply_for(&self, needle: &str, status: u16, body: Value) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(needle, Ok(TransportResponse::new(status, body)), Some(rx));
        tx
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn push(
        &self,
        needle: &str,
        response: Result<TransportResponse, TransportError>,
        gate: Option<oneshot::Receiver<()>>,
    ) {
        self.replies.lock().unwrap().push(Reply {
            needle: needle.to_string(),
            response,
            gate,
        });
    }

    async fn answer(&self, request: String) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            replies
                .iter()
                .position(|r| request.contains(&r.needle))
                .map(|i| replies.remove(i))
        };

        match reply {
            Some(Reply { response, gate, .. }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                response
            }
            None => Err(TransportError::Network(format!("no reply for {request}"))),
        }
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &str, query: &QueryParams) -> Result<TransportResponse, TransportError> {
        self.answer(format!("GET {url} {query:?}")).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<TransportResponse, TransportError> {
        self.answer(format!("POST {url} {body}")).await
    }
}

// ============================================================================
// Recording Display
// ============================================================================

#[derive(Default)]
pub struct RecordingDisplay {
    texts: Mutex<HashMap<DisplayField, String>>,
    notices: Mutex<Vec<Notice>>,
    loading: Mutex<Vec<bool>>,
    results_visible: Mutex<Option<bool>>,
}

impl RecordingDisplay {
    pub fn text(&self, field: DisplayField) -> Option<String> {
        self.texts.lock().unwrap().get(&field).cloned()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn loading_changes(&self) -> Vec<bool> {
        self.loading.lock().unwrap().clone()
    }

    pub fn results_visible(&self) -> Option<bool> {
        *self.results_visible.lock().unwrap()
    }
}

impl DisplaySurface for RecordingDisplay {
    fn set_text(&self, field: DisplayField, text: &str) {
        self.texts.lock().unwrap().insert(field, text.to_string());
    }

    fn set_loading(&self, visible: bool) {
        self.loading.lock().unwrap().push(visible);
    }

    fn set_results_visible(&self, visible: bool) {
        *self.results_visible.lock().unwrap() = Some(visible);
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub controller: RequestController<HeadlessMap>,
    pub layers: SharedLayers<HeadlessMap>,
    pub display: Arc<RecordingDisplay>,
    pub transport: Arc<StubTransport>,
}

impl Harness {
    pub fn new(transport: Arc<StubTransport>) -> Self {
        let config = Config::default();
        let services = ServiceSet::http(&config, transport.clone());
        let layers = LayerManager::shared(HeadlessMap::new());
        let display = Arc::new(RecordingDisplay::default());
        let controller =
            RequestController::new(services, layers.clone(), display.clone(), config.render);
        Self {
            controller,
            layers,
            display,
            transport,
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn geocode_ok(lat: f64, lng: f64) -> Value {
    json!({
        "status": "OK",
        "results": [{"geometry": {"location": {"lat": lat, "lng": lng}}}]
    })
}

pub fn geocode_status(status: &str) -> Value {
    json!({"status": status, "results": []})
}

/// A successful analysis for `city` whose tile URLs carry `tag`
pub fn history_ok(city: &str, tag: &str) -> Value {
    json!({
        "success": true,
        "city": city,
        "year": 2015,
        "flood_percentage": 7.25,
        "was_flooded": "YES",
        "historical_note": "",
        "aoi": {
            "type": "Polygon",
            "coordinates": [[[-8.57, 52.0], [-8.57, 51.73], [-7.96, 51.73], [-7.96, 52.0], [-8.57, 52.0]]]
        },
        "map_tiles": {
            "flood": format!("https://tiles.test/{tag}/flood/{{z}}/{{x}}/{{y}}"),
            "aoi": format!("https://tiles.test/{tag}/aoi/{{z}}/{{x}}/{{y}}")
        }
    })
}

pub fn history_failure(message: &str) -> Value {
    json!({"success": false, "error": message})
}

pub fn detection_ok(url: &str) -> Value {
    json!({"status": "success", "map_url": url})
}
