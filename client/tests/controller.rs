//! Integration Tests for the request controller
//!
//! Run the real HTTP services over a stub transport and check what ends up
//! on the display and the headless map.

use chrono::NaiveDate;
use floodrisk_client::error::ErrorClass;
use floodrisk_client::map::{LayerHandle, MapEvent, Viewport};
use floodrisk_client::transport::TransportError;
use floodrisk_client::types::{DetectionRequest, Location};
use floodrisk_client::{ActionOutcome, DisplayField, FloodError};
use serde_json::Value;

mod common;
use common::*;

fn initial_viewport() -> Viewport {
    Viewport::Centered {
        center: Location::new(51.8969, -8.4863),
        zoom: 10,
    }
}

fn detection_request(city: &str) -> DetectionRequest {
    DetectionRequest {
        city: city.to_string(),
        pre_event_start: NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
        pre_event_end: NaiveDate::from_ymd_opt(2023, 10, 17).unwrap(),
        post_event_start: NaiveDate::from_ymd_opt(2023, 10, 18).unwrap(),
        post_event_end: NaiveDate::from_ymd_opt(2023, 10, 25).unwrap(),
    }
}

// ============================================================================
// Location lookup
// ============================================================================

mod find_location {
    use super::*;

    #[tokio::test]
    async fn test_ok_lookup_recenters_at_zoom_12() {
        let transport = StubTransport::new();
        transport.reply(200, geocode_ok(51.9, -8.47));
        let harness = Harness::new(transport);
        harness.controller.initialize().await;

        let outcome = harness.controller.find_location("T12 XY34").await;

        assert!(outcome.is_rendered(), "unexpected outcome {outcome:?}");
        let layers = harness.layers.lock().await;
        assert_eq!(
            layers.map().viewport(),
            Some(Viewport::Centered {
                center: Location::new(51.9, -8.47),
                zoom: 12
            })
        );
        assert!(layers.layers().is_empty(), "recentering must not touch overlays");
        assert_eq!(
            harness.display.text(DisplayField::LocationResult).as_deref(),
            Some("Latitude: 51.9, Longitude: -8.47")
        );
    }

    #[tokio::test]
    async fn test_blank_code_is_rejected_without_request() {
        let transport = StubTransport::new();
        let harness = Harness::new(transport.clone());
        harness.controller.initialize().await;

        let outcome = harness.controller.find_location("   ").await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failed(FloodError::InputValidation(_))
        ));
        assert_eq!(transport.call_count(), 0);

        let notices = harness.display.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].class, ErrorClass::Validation);
        assert_eq!(notices[0].message, "Please enter a valid Eircode.");
        assert_eq!(
            harness.layers.lock().await.map().viewport(),
            Some(initial_viewport())
        );
    }

    #[tokio::test]
    async fn test_zero_results_leaves_viewport_unchanged() {
        let transport = StubTransport::new();
        transport.reply(200, geocode_status("ZERO_RESULTS"));
        let harness = Harness::new(transport);
        harness.controller.initialize().await;

        let outcome = harness.controller.find_location("NOWHERE").await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failed(FloodError::GeocodeStatus(ref s)) if s == "ZERO_RESULTS"
        ));
        assert_eq!(
            harness.layers.lock().await.map().viewport(),
            Some(initial_viewport())
        );
        assert_eq!(harness.display.text(DisplayField::LocationResult), None);

        let notices = harness.display.notices();
        assert_eq!(notices[0].class, ErrorClass::Application);
        assert_eq!(
            notices[0].message,
            "Failed to find location: Geocoding failed: ZERO_RESULTS"
        );
    }
}

// ============================================================================
// Flood history
// ============================================================================

mod flood_history {
    use super::*;

    #[tokio::test]
    async fn test_success_renders_fields_overlays_and_fit() {
        let transport = StubTransport::new();
        transport.reply(200, history_ok("Cork, Ireland", "cork"));
        let harness = Harness::new(transport);

        let outcome = harness.controller.check_flood_history("Cork").await;
        assert!(outcome.is_rendered(), "unexpected outcome {outcome:?}");

        let display = &harness.display;
        assert_eq!(
            display.text(DisplayField::ResultCity).as_deref(),
            Some("Cork, Ireland")
        );
        assert_eq!(display.text(DisplayField::ResultYear).as_deref(), Some("2015"));
        assert_eq!(
            display.text(DisplayField::ResultPercentage).as_deref(),
            Some("7.25")
        );
        assert_eq!(display.text(DisplayField::ResultFlooded).as_deref(), Some("YES"));
        assert_eq!(display.results_visible(), Some(true));

        let layers = harness.layers.lock().await;
        let live: Vec<_> = layers.map().live_layers().values().cloned().collect();
        assert_eq!(live.len(), 2);
        assert!(live.iter().any(|o| o.url_template.contains("/cork/flood/") && o.opacity == 0.7));
        assert!(live.iter().any(|o| o.url_template.contains("/cork/aoi/") && o.opacity == 0.5));
        assert!(matches!(
            layers.map().viewport(),
            Some(Viewport::Fitted(b)) if b.south == 51.73 && b.north == 52.0 && b.west == -8.57 && b.east == -7.96
        ));
    }

    #[tokio::test]
    async fn test_prior_pair_removed_before_new_pair() {
        let transport = StubTransport::new();
        transport.reply_for("Limerick", 200, history_ok("Limerick", "a"));
        transport.reply_for("Galway", 200, history_ok("Galway", "b"));
        let harness = Harness::new(transport);

        assert!(harness.controller.check_flood_history("Limerick").await.is_rendered());
        let old = harness.layers.lock().await.layers();
        assert!(harness.controller.check_flood_history("Galway").await.is_rendered());

        let layers = harness.layers.lock().await;
        let events = layers.map().events();
        let removed_at = |h: LayerHandle| {
            events
                .iter()
                .position(|e| *e == MapEvent::LayerRemoved(h))
                .expect("old layer removed")
        };
        let first_new_add = events
            .iter()
            .position(|e| matches!(e, MapEvent::LayerAdded { overlay, .. } if overlay.url_template.contains("/b/")))
            .expect("new layer added");

        assert!(removed_at(old.flood.unwrap()) < first_new_add);
        assert!(removed_at(old.aoi.unwrap()) < first_new_add);
        assert!(layers.map().peak_live() <= 2);
        assert!(
            layers
                .map()
                .live_layers()
                .values()
                .all(|o| o.url_template.contains("/b/"))
        );
    }

    #[tokio::test]
    async fn test_backend_failure_shows_message_and_keeps_map() {
        let transport = StubTransport::new();
        transport.reply(200, history_failure("no data"));
        let harness = Harness::new(transport);

        let outcome = harness.controller.check_flood_history("Atlantis").await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failed(FloodError::Analysis(ref m)) if m == "no data"
        ));
        let notices = harness.display.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Error: no data");
        assert_eq!(harness.display.results_visible(), None);

        let layers = harness.layers.lock().await;
        assert!(layers.layers().is_empty());
        assert!(layers.map().events().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_and_releases_loading() {
        let transport = StubTransport::new();
        transport.reply(500, Value::Null);
        let harness = Harness::new(transport);

        let outcome = harness.controller.check_flood_history("Cork").await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failed(FloodError::Transport(TransportError::Status { status: 500 }))
        ));
        let notices = harness.display.notices();
        assert_eq!(notices[0].class, ErrorClass::Transport);
        assert!(notices[0].message.starts_with("Failed to analyze flood: "));
        assert_eq!(harness.display.loading_changes(), vec![true, false]);
        assert_eq!(harness.controller.loading().active(), 0);
    }

    #[tokio::test]
    async fn test_aoi_without_coordinates_fails_before_any_mutation() {
        let transport = StubTransport::new();
        let mut body = history_ok("Cork", "cork");
        body["aoi"] = serde_json::json!({"type": "Polygon", "coordinates": []});
        transport.reply(200, body);
        let harness = Harness::new(transport);

        let outcome = harness.controller.check_flood_history("Cork").await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failed(FloodError::MalformedResponse(_))
        ));
        assert_eq!(harness.display.text(DisplayField::ResultCity), None);
        assert!(harness.layers.lock().await.map().events().is_empty());
    }

    #[tokio::test]
    async fn test_blank_city_is_rejected_without_request() {
        let transport = StubTransport::new();
        let harness = Harness::new(transport.clone());

        let outcome = harness.controller.check_flood_history("  ").await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failed(FloodError::InputValidation(_))
        ));
        assert_eq!(transport.call_count(), 0);
        assert_eq!(harness.display.notices()[0].class, ErrorClass::Validation);
        assert!(harness.layers.lock().await.map().events().is_empty());
    }
}

// ============================================================================
// Change detection
// ============================================================================

mod change_detection {
    use super::*;

    #[tokio::test]
    async fn test_detection_replaces_history_overlays() {
        let transport = StubTransport::new();
        transport.reply_for("analyze_flood", 200, history_ok("Cork", "hist"));
        transport.reply_for("detect_flood", 200, detection_ok("https://tiles.test/change/{z}/{x}/{y}"));
        let harness = Harness::new(transport);

        assert!(harness.controller.check_flood_history("Cork").await.is_rendered());
        let outcome = harness
            .controller
            .detect_flood_change(&detection_request("Cork"))
            .await;
        assert!(outcome.is_rendered(), "unexpected outcome {outcome:?}");

        let layers = harness.layers.lock().await;
        let live: Vec<_> = layers.map().live_layers().values().cloned().collect();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].url_template, "https://tiles.test/change/{z}/{x}/{y}");
        assert!(layers.layers().aoi.is_none());
        assert_eq!(
            harness.display.text(DisplayField::DetectionStatus).as_deref(),
            Some("success")
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected_without_mutation() {
        let transport = StubTransport::new();
        transport.reply(200, serde_json::json!({"status": "error", "map_url": ""}));
        let harness = Harness::new(transport);

        let outcome = harness
            .controller
            .detect_flood_change(&detection_request("Cork"))
            .await;

        assert!(matches!(outcome, ActionOutcome::Rejected { ref status } if status == "error"));
        assert_eq!(harness.display.notices().len(), 1);
        assert!(harness.layers.lock().await.map().events().is_empty());
        assert_eq!(harness.display.loading_changes(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_inverted_window_is_a_validation_failure() {
        let transport = StubTransport::new();
        let harness = Harness::new(transport.clone());
        let mut request = detection_request("Cork");
        request.post_event_end = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();

        let outcome = harness.controller.detect_flood_change(&request).await;

        assert!(matches!(
            outcome,
            ActionOutcome::Failed(FloodError::InputValidation(_))
        ));
        assert_eq!(transport.call_count(), 0);
        assert_eq!(harness.display.notices()[0].class, ErrorClass::Validation);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn test_late_response_of_older_request_is_discarded() {
        let transport = StubTransport::new();
        let release_first = transport.gated_reply_for("First", 200, history_ok("First", "first"));
        transport.reply_for("Second", 200, history_ok("Second", "second"));
        let harness = Harness::new(transport);

        let first = harness.controller.check_flood_history("First");
        let second = async {
            let outcome = harness.controller.check_flood_history("Second").await;
            release_first.send(()).unwrap();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, ActionOutcome::Superseded), "got {first:?}");
        assert!(second.is_rendered(), "got {second:?}");

        assert_eq!(
            harness.display.text(DisplayField::ResultCity).as_deref(),
            Some("Second")
        );
        let layers = harness.layers.lock().await;
        assert!(
            layers
                .map()
                .live_layers()
                .values()
                .all(|o| o.url_template.contains("/second/"))
        );
        assert!(harness.display.notices().is_empty());
        assert_eq!(harness.display.loading_changes(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_location_and_history_do_not_supersede_each_other() {
        let transport = StubTransport::new();
        let release_history = transport.gated_reply_for("analyze_flood", 200, history_ok("Cork", "cork"));
        transport.reply_for("geocode", 200, geocode_ok(51.9, -8.47));
        let harness = Harness::new(transport);

        let history = harness.controller.check_flood_history("Cork");
        let location = async {
            let outcome = harness.controller.find_location("T12 XY34").await;
            release_history.send(()).unwrap();
            outcome
        };
        let (history, location) = tokio::join!(history, location);

        assert!(history.is_rendered(), "got {history:?}");
        assert!(location.is_rendered(), "got {location:?}");
        assert!(harness.layers.lock().await.layers().flood.is_some());
        assert_eq!(harness.controller.loading().active(), 0);
    }

    #[tokio::test]
    async fn test_detection_supersedes_pending_history() {
        let transport = StubTransport::new();
        let release_history = transport.gated_reply_for("analyze_flood", 200, history_ok("Cork", "hist"));
        transport.reply_for("detect_flood", 200, detection_ok("https://tiles.test/change/{z}/{x}/{y}"));
        let harness = Harness::new(transport);

        let request = detection_request("Cork");
        let history = harness.controller.check_flood_history("Cork");
        let detection = async {
            let outcome = harness.controller.detect_flood_change(&request).await;
            release_history.send(()).unwrap();
            outcome
        };
        let (history, detection) = tokio::join!(history, detection);

        assert!(matches!(history, ActionOutcome::Superseded));
        assert!(detection.is_rendered());
        let layers = harness.layers.lock().await;
        assert_eq!(layers.map().live_layers().len(), 1);
        assert_eq!(harness.display.results_visible(), None);
    }
}
