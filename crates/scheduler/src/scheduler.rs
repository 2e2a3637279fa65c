//! Recording Poller Implementation

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, FailurePolicy, PollerConfig};
use alerting::{Alert, AlertManager, Alerter};
use chrono::Timelike;
use std::future::Future;
use std::time::Duration;
use storage::{Measurement, MeasurementStore, NewMeasurement, StorageError};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use weather_client::{CurrentWeather, OpenMeteoClient, WeatherError};

/// Errors raised by a single poll
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Weather fetch failed: {0}")]
    Fetch(#[from] WeatherError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PollError {
    /// Alert deduplication key
    fn kind(&self) -> &'static str {
        match self {
            PollError::Fetch(_) => "weather_fetch",
            PollError::Storage(_) => "storage",
            PollError::Config(_) => "config",
        }
    }
}

/// Result of one check of the clock
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Current hour is not a recording hour
    OutsideWindow,
    /// A sample already exists for this hour and date
    AlreadyRecorded(Measurement),
    /// A new sample was fetched and stored
    Recorded(Measurement),
}

/// Provider of current weather readings
pub trait WeatherSource: Send + Sync {
    fn current(&self) -> impl Future<Output = Result<CurrentWeather, WeatherError>> + Send;
}

impl WeatherSource for OpenMeteoClient {
    async fn current(&self) -> Result<CurrentWeather, WeatherError> {
        self.fetch_current().await
    }
}

/// Polling loop that captures one sample per recording hour and day
pub struct Poller<W, A, C = SystemClock> {
    config: PollerConfig,
    store: MeasurementStore,
    source: W,
    alerter: A,
    clock: C,
    alerts: AlertManager,
}

impl<W, A, C> Poller<W, A, C>
where
    W: WeatherSource,
    A: Alerter,
    C: Clock,
{
    /// Create a new poller
    pub fn new(
        config: PollerConfig,
        store: MeasurementStore,
        source: W,
        alerter: A,
        clock: C,
        alerts: AlertManager,
    ) -> Self {
        info!(
            "Poller created for hours {:?} ({:?})",
            config.recording_hours, config.failure_policy
        );
        Self {
            config,
            store,
            source,
            alerter,
            clock,
            alerts,
        }
    }

    /// Check the clock once and record a sample if one is due
    ///
    /// Only a missing row triggers a fetch; a failed lookup is an error.
    pub async fn tick(&self) -> Result<TickOutcome, PollError> {
        let now = self.clock.now();
        let hour = now.hour();

        if !self.config.recording_hours.contains(&hour) {
            return Ok(TickOutcome::OutsideWindow);
        }

        let date = self.config.render_date(&now)?;

        if let Some(existing) = self.store.find_by_hour_and_date(hour, &date).await? {
            debug!("Hour {} on {} already recorded (id {})", hour, date, existing.id);
            return Ok(TickOutcome::AlreadyRecorded(existing));
        }

        let current = self.source.current().await?;
        let stored = self
            .store
            .insert(NewMeasurement {
                hour,
                date,
                temperature: current.temperature,
                wind_speed: current.windspeed,
            })
            .await?;

        metrics::counter!("weather_measurements_recorded_total").increment(1);
        info!(
            "Record saved: hour {} on {} = {}°C, wind {} km/h",
            stored.hour, stored.date, stored.temperature, stored.wind_speed
        );
        Ok(TickOutcome::Recorded(stored))
    }

    /// Run the polling loop
    ///
    /// Only returns when a tick fails under [`FailurePolicy::Exit`].
    pub async fn run(&mut self) -> Result<(), PollError> {
        info!("Starting poller");
        let mut backoff: Option<Duration> = None;

        loop {
            match self.tick().await {
                Ok(TickOutcome::OutsideWindow) => {
                    backoff = None;
                    self.idle().await;
                }
                Ok(_) => {
                    backoff = None;
                    tokio::time::sleep(self.config.recorded_interval()).await;
                }
                Err(e) => {
                    metrics::counter!("weather_poll_failures_total").increment(1);
                    self.report(&e).await;

                    match &self.config.failure_policy {
                        FailurePolicy::Exit => {
                            error!("Poller stopping: {}", e);
                            return Err(e);
                        }
                        FailurePolicy::Retry {
                            initial_backoff_ms,
                            max_backoff_ms,
                        } => {
                            let delay = next_backoff(
                                backoff,
                                Duration::from_millis(*initial_backoff_ms),
                                Duration::from_millis(*max_backoff_ms),
                            );
                            warn!("Poll failed, retrying in {:?}: {}", delay, e);
                            backoff = Some(delay);
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }
    }

    async fn idle(&self) {
        let interval = self.config.idle_interval();
        if interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(interval).await;
        }
    }

    /// Best-effort alert delivery, throttled per failure kind
    async fn report(&mut self, err: &PollError) {
        let kind = err.kind();
        if !self.alerts.should_fire(kind) {
            return;
        }
        self.alerter
            .notify(&Alert::recording_failure(err.to_string()))
            .await;
        self.alerts.record_fire(kind);
    }

    /// Alert throttle state
    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }
}

/// Doubling backoff starting at `initial`, capped at `max`
fn next_backoff(previous: Option<Duration>, initial: Duration, max: Duration) -> Duration {
    match previous {
        None => initial.min(max),
        Some(prev) => prev.saturating_mul(2).min(max),
    }
}
