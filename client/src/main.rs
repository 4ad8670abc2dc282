use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use axum::{Router, response::IntoResponse, routing::get};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use floodrisk_client::config::Config;
use floodrisk_client::display::ConsoleDisplay;
use floodrisk_client::map::{HeadlessMap, LayerManager, MapEvent};
use floodrisk_client::proxy::{ProxyState, proxy_routes};
use floodrisk_client::services::ServiceSet;
use floodrisk_client::transport::HttpTransport;
use floodrisk_client::types::DetectionRequest;
use floodrisk_client::{ActionOutcome, RequestController};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prometheus metrics handle for exposing metrics in Prometheus format
static PROMETHEUS_HANDLE: std::sync::OnceLock<PrometheusHandle> = std::sync::OnceLock::new();

#[derive(Parser)]
#[command(name = "floodrisk", author, version, about = "Flood-risk map client and geocode proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the geocode proxy
    Proxy,
    /// Geocode a location code and recenter the map on it
    Locate {
        /// Eircode or address to look up
        code: String,
    },
    /// Historical flood analysis for a city
    History {
        city: String,
    },
    /// Pre/post-event change detection for a city
    Detect {
        city: String,
        #[arg(long)]
        pre_start: NaiveDate,
        #[arg(long)]
        pre_end: NaiveDate,
        #[arg(long)]
        post_start: NaiveDate,
        #[arg(long)]
        post_end: NaiveDate,
    },
}

/// Endpoint to expose metrics in Prometheus format
async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

async fn serve_proxy(config: Config) -> anyhow::Result<()> {
    // Must be installed before any metric is recorded
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    PROMETHEUS_HANDLE.set(handle).ok();

    if config.proxy.api_key.is_none() {
        warn!("GEOCODE_API_KEY is not set - geocode lookups will be refused");
    }

    let transport = Arc::new(HttpTransport::new(config.endpoints.request_timeout)?);
    let state = ProxyState::new(transport, &config.proxy);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/metrics/prometheus", get(prometheus_metrics))
        .merge(proxy_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.proxy.host, config.proxy.port).parse()?;
    info!("Geocode proxy listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_action(config: Config, command: Command) -> anyhow::Result<()> {
    let transport = Arc::new(HttpTransport::new(config.endpoints.request_timeout)?);
    let services = ServiceSet::http(&config, transport);
    let layers = LayerManager::shared(HeadlessMap::new());
    let controller = RequestController::new(
        services,
        layers.clone(),
        Arc::new(ConsoleDisplay),
        config.render,
    );
    controller.initialize().await;

    let start = Instant::now();
    let outcome = match command {
        Command::Locate { code } => controller.find_location(&code).await,
        Command::History { city } => controller.check_flood_history(&city).await,
        Command::Detect {
            city,
            pre_start,
            pre_end,
            post_start,
            post_end,
        } => {
            let request = DetectionRequest {
                city,
                pre_event_start: pre_start,
                pre_event_end: pre_end,
                post_event_start: post_start,
                post_event_end: post_end,
            };
            controller.detect_flood_change(&request).await
        }
        Command::Proxy => bail!("the proxy is not a map action"),
    };
    info!("Finished in {:?}", start.elapsed());

    let layers = layers.lock().await;
    for event in layers.map().events() {
        match event {
            MapEvent::LayerAdded { overlay, .. } => {
                println!("overlay {} (opacity {})", overlay.url_template, overlay.opacity)
            }
            MapEvent::ViewSet { center, zoom } => {
                println!("view ({}, {}) zoom {}", center.latitude, center.longitude, zoom)
            }
            MapEvent::BoundsFitted(b) => println!(
                "fit [{}, {}] - [{}, {}]",
                b.south, b.west, b.north, b.east
            ),
            MapEvent::LayerRemoved(_) => {}
        }
    }

    match outcome {
        ActionOutcome::Rendered => Ok(()),
        ActionOutcome::Failed(err) => Err(err.into()),
        ActionOutcome::Rejected { status } => bail!("change detection returned status {status}"),
        ActionOutcome::Superseded => bail!("action was superseded"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "floodrisk=debug,floodrisk_client=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        "Loaded configuration: backend={}, geocoder={}",
        config.endpoints.backend_url, config.endpoints.geocode_url
    );

    match cli.command {
        Command::Proxy => serve_proxy(config).await,
        command => run_action(config, command).await,
    }
}
