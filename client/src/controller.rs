//! Request controller
//!
//! Binds user actions to the services, the shared map context and the
//! display surface. Every action runs Idle -> Pending -> Rendered/Failed:
//! the loading indicator is held for the whole Pending phase, the network
//! call happens without any lock held, and results are applied under the
//! map-context mutex only if no newer action on the same channel started
//! in the meantime.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, error, info, warn};

use crate::config::RenderConfig;
use crate::display::{DisplayField, DisplaySurface, LoadingIndicator, Notice, failure_notice};
use crate::error::{ErrorClass, FloodError};
use crate::map::{LayerManager, MapSurface, SharedLayers};
use crate::services::ServiceSet;
use crate::types::{AnalysisResult, DetectionRequest, DetectionResult, Location};

/// Notice shown when a location code is rejected before lookup
pub const INVALID_CODE_NOTICE: &str = "Please enter a valid Eircode.";

/// User-triggerable actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    FindLocation,
    FloodHistory,
    ChangeDetection,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::FindLocation => "find_location",
            ActionKind::FloodHistory => "flood_history",
            ActionKind::ChangeDetection => "change_detection",
        }
    }
}

/// How an action ended
#[derive(Debug)]
pub enum ActionOutcome {
    /// Display and map were updated
    Rendered,
    /// A notice was shown; the map was left untouched
    Failed(FloodError),
    /// A newer action on the same channel started first; result dropped
    Superseded,
    /// Change detection answered with a non-success status
    Rejected { status: String },
}

impl ActionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ActionOutcome::Rendered => "rendered",
            ActionOutcome::Failed(_) => "failed",
            ActionOutcome::Superseded => "superseded",
            ActionOutcome::Rejected { .. } => "rejected",
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, ActionOutcome::Rendered)
    }
}

/// Monotonic ticket counter for one channel
#[derive(Debug, Default)]
struct Epoch(AtomicU64);

impl Epoch {
    fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

pub struct RequestController<M: MapSurface> {
    services: ServiceSet,
    layers: SharedLayers<M>,
    display: Arc<dyn DisplaySurface>,
    loading: LoadingIndicator,
    render: RenderConfig,
    /// Location lookups only move the viewport
    view_epoch: Epoch,
    /// History and change detection share the overlay slots
    overlay_epoch: Epoch,
}

impl<M: MapSurface> RequestController<M> {
    pub fn new(
        services: ServiceSet,
        layers: SharedLayers<M>,
        display: Arc<dyn DisplaySurface>,
        render: RenderConfig,
    ) -> Self {
        Self {
            services,
            layers,
            loading: LoadingIndicator::new(display.clone()),
            display,
            render,
            view_epoch: Epoch::default(),
            overlay_epoch: Epoch::default(),
        }
    }

    pub fn layers(&self) -> &SharedLayers<M> {
        &self.layers
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    /// Apply the configured initial viewport
    pub async fn initialize(&self) {
        let mut layers = self.layers.lock().await;
        layers.initialize(self.render.initial_center, self.render.initial_zoom);
        info!(
            "Map initialized at ({}, {}) zoom {}",
            self.render.initial_center.latitude,
            self.render.initial_center.longitude,
            self.render.initial_zoom
        );
    }

    /// Geocode a location code and recenter the map on it
    pub async fn find_location(&self, code: &str) -> ActionOutcome {
        self.run(
            ActionKind::FindLocation,
            &self.view_epoch,
            self.services.geocoder.lookup(code),
            |layers, location: Location| {
                self.display.set_text(
                    DisplayField::LocationResult,
                    &format!(
                        "Latitude: {}, Longitude: {}",
                        location.latitude, location.longitude
                    ),
                );
                layers.recenter(location, self.render.location_zoom);
                Ok(ActionOutcome::Rendered)
            },
            |err| match err {
                FloodError::InputValidation(_) => {
                    Notice::new(ErrorClass::Validation, INVALID_CODE_NOTICE)
                }
                _ => failure_notice("Failed to find location", err),
            },
        )
        .await
    }

    /// Run the historical analysis for `city` and show its overlays
    pub async fn check_flood_history(&self, city: &str) -> ActionOutcome {
        self.run(
            ActionKind::FloodHistory,
            &self.overlay_epoch,
            self.services.history.analyze(city),
            |layers, result: AnalysisResult| self.render_history(layers, result),
            |err| match err {
                FloodError::Analysis(message) => {
                    Notice::new(ErrorClass::Application, format!("Error: {message}"))
                }
                _ => failure_notice("Failed to analyze flood", err),
            },
        )
        .await
    }

    /// Run pre/post-event change detection and show its overlay
    pub async fn detect_flood_change(&self, request: &DetectionRequest) -> ActionOutcome {
        self.run(
            ActionKind::ChangeDetection,
            &self.overlay_epoch,
            self.services.detection.detect(request),
            |layers, result: DetectionResult| self.render_detection(layers, result),
            |err| failure_notice("Flood detection failed", err),
        )
        .await
    }

    fn render_history(
        &self,
        layers: &mut LayerManager<M>,
        result: AnalysisResult,
    ) -> Result<ActionOutcome, FloodError> {
        // Refuse before touching anything if the AOI cannot be framed
        if result.aoi.bounds().is_none() {
            return Err(FloodError::malformed("aoi has no coordinates"));
        }

        self.display.set_text(DisplayField::ResultCity, &result.city);
        self.display
            .set_text(DisplayField::ResultYear, &result.year.to_string());
        self.display.set_text(
            DisplayField::ResultPercentage,
            &result.flood_percentage.to_string(),
        );
        self.display.set_text(
            DisplayField::ResultFlooded,
            if result.was_flooded { "YES" } else { "NO" },
        );
        self.display
            .set_text(DisplayField::HistoricalNote, &result.historical_note);

        layers.install_pair(
            &result.flood_tile_url_template,
            self.render.flood_opacity,
            &result.aoi_tile_url_template,
            self.render.aoi_opacity,
        );
        layers.fit_to_geometry(&result.aoi)?;

        self.display.set_results_visible(true);
        Ok(ActionOutcome::Rendered)
    }

    fn render_detection(
        &self,
        layers: &mut LayerManager<M>,
        result: DetectionResult,
    ) -> Result<ActionOutcome, FloodError> {
        let url = match (result.is_success(), result.map_tile_url) {
            (true, Some(url)) => url,
            (true, None) => return Err(FloodError::malformed("successful detection has no map_url")),
            (false, _) => {
                self.display.notify(&Notice::new(
                    ErrorClass::Application,
                    format!("Flood detection failed: status {}", result.status),
                ));
                return Ok(ActionOutcome::Rejected {
                    status: result.status,
                });
            }
        };

        self.display
            .set_text(DisplayField::DetectionStatus, &result.status);
        // Detection output replaces whatever history left on the map
        layers.clear_all();
        layers.set_flood_layer(&url, self.render.flood_opacity);
        Ok(ActionOutcome::Rendered)
    }

    /// Shared Pending -> Rendered/Failed driver
    async fn run<T, F, A, N>(
        &self,
        kind: ActionKind,
        channel: &Epoch,
        request: F,
        apply: A,
        notice: N,
    ) -> ActionOutcome
    where
        F: Future<Output = Result<T, FloodError>>,
        A: FnOnce(&mut LayerManager<M>, T) -> Result<ActionOutcome, FloodError>,
        N: FnOnce(&FloodError) -> Notice,
    {
        let start = Instant::now();
        let loading = self.loading.acquire();
        let ticket = channel.issue();
        debug!(action = kind.as_str(), ticket, "Action pending");

        let result = request.await;

        let mut layers = self.layers.lock().await;
        let outcome = if !channel.is_current(ticket) {
            info!(
                action = kind.as_str(),
                ticket, "Discarding result of superseded action"
            );
            ActionOutcome::Superseded
        } else {
            match result.and_then(|value| apply(&mut *layers, value)) {
                Ok(outcome) => outcome,
                Err(err) => ActionOutcome::Failed(err),
            }
        };
        drop(layers);
        drop(loading);

        if let ActionOutcome::Failed(err) = &outcome {
            match err.class() {
                ErrorClass::Validation => warn!(action = kind.as_str(), "{}", err),
                _ => error!(action = kind.as_str(), code = err.code(), "{}", err),
            }
            self.display.notify(&notice(err));
        }

        counter!(
            "floodrisk_actions_total",
            "action" => kind.as_str(),
            "outcome" => outcome.label()
        )
        .increment(1);
        histogram!("floodrisk_action_duration_seconds", "action" => kind.as_str())
            .record(start.elapsed());

        debug!(
            action = kind.as_str(),
            ticket,
            outcome = outcome.label(),
            "Action finished"
        );
        outcome
    }
}
