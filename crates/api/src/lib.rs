//! Weather Recorder API Server
//!
//! Serves averaged temperature readings and runs the sampling poller
//! alongside the HTTP server.

use axum::{extract::State, http::Method, response::IntoResponse, routing::get, Json, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod error;
mod routes;
mod settings;

pub use error::ApiError;
pub use routes::average::{mean_temperature, HourAverageResponse};
pub use settings::{LogFormat, Settings, SettingsError, CONFIG_PATH_ENV};

use alerting::{Alert, AlertManager, Alerter, WebhookAlerter};
use scheduler::{Poller, PollerConfig, SystemClock};
use storage::MeasurementStore;
use weather_client::OpenMeteoClient;

/// Application state shared across handlers
pub struct AppState {
    /// Measurement store
    pub store: MeasurementStore,
    /// Hours reported by the aggregate endpoint
    pub recording_hours: Vec<u32>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        store: MeasurementStore,
        poller: &PollerConfig,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            store,
            recording_hours: poller.recording_hours.iter().copied().collect(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics,
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub measurement_count: Option<i64>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/average", get(routes::average::get_averages))
        .route("/average/:hour", get(routes::average::get_hour_average))
        .route("/health", get(health_handler))
        .route("/metrics", get(routes::metrics::get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let measurement_count = match state.store.count().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Health check could not count measurements: {}", e);
            None
        }
    };

    let status = match measurement_count {
        Some(_) => "healthy",
        None => "degraded",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        measurement_count,
    })
}

/// Initialize logging
pub fn init_logging(format: LogFormat) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish()),
    }
}

/// Serve the API until the listener fails
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), std::io::Error> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// Open the store, start the poller and serve the API
///
/// Returns when the server fails, the poller gives up, or on Ctrl-C.
pub async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let alerter = WebhookAlerter::new(settings.alerting.webhook_url.clone())?;

    let store = match MeasurementStore::connect(&settings.database_url).await {
        Ok(store) => store,
        Err(e) => {
            alerter.notify(&Alert::recording_failure(e.to_string())).await;
            return Err(e.into());
        }
    };

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder unavailable: {}", e);
            None
        }
    };

    let client = OpenMeteoClient::new(&settings.weather)?;
    let mut poller = Poller::new(
        settings.poller.clone(),
        store.clone(),
        client,
        alerter,
        SystemClock,
        AlertManager::new(settings.alerting.clone()),
    );
    let poller_task = tokio::spawn(async move { poller.run().await });

    let state = Arc::new(AppState::new(store, &settings.poller, metrics));

    tokio::select! {
        result = serve(&settings.listen_addr, state) => result?,
        joined = poller_task => joined??,
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    Ok(())
}
