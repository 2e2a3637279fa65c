//! Weather Recorder - Main Entry Point

use api::{init_logging, run, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::load()?;
    init_logging(settings.log_format)?;

    info!("=== Weather Recorder v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Recording hours {:?} at ({}, {})",
        settings.poller.recording_hours, settings.weather.latitude, settings.weather.longitude
    );

    run(settings).await
}
