//! Poller configuration

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("No recording hours configured")]
    NoRecordingHours,

    #[error("Recording hour {0} is outside 0-23")]
    InvalidHour(u32),

    #[error("Invalid date format: {0:?}")]
    InvalidDateFormat(String),

    #[error("Invalid retry backoff: {0}")]
    InvalidBackoff(String),
}

/// What the poller does after a failed tick has been reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the loop and hand the error to the caller
    #[default]
    Exit,
    /// Keep going after an exponential backoff
    Retry {
        initial_backoff_ms: u64,
        max_backoff_ms: u64,
    },
}

/// Poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Hours of day (0-23) at which a sample is captured
    pub recording_hours: BTreeSet<u32>,

    /// Pause after handling a recording hour (milliseconds)
    pub recorded_interval_ms: u64,

    /// Pause between checks outside recording hours (milliseconds, 0 only yields)
    pub idle_interval_ms: u64,

    /// strftime format used for the stored date
    pub date_format: String,

    pub failure_policy: FailurePolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            recording_hours: BTreeSet::from([10, 15, 21]),
            recorded_interval_ms: 10 * 60 * 1000,
            idle_interval_ms: 1000,
            date_format: "%Y-%m-%d".to_string(),
            failure_policy: FailurePolicy::Exit,
        }
    }
}

impl PollerConfig {
    /// Check hours and date format before the loop starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recording_hours.is_empty() {
            return Err(ConfigError::NoRecordingHours);
        }
        if let Some(&hour) = self.recording_hours.iter().find(|&&h| h > 23) {
            return Err(ConfigError::InvalidHour(hour));
        }

        let broken = StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error));
        if broken || self.date_format.trim().is_empty() {
            return Err(ConfigError::InvalidDateFormat(self.date_format.clone()));
        }

        // Timezone items parse fine but cannot render from a naive time
        let sample = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap_or_default();
        self.render_date(&sample)?;

        if let FailurePolicy::Retry {
            initial_backoff_ms,
            max_backoff_ms,
        } = self.failure_policy
        {
            if initial_backoff_ms == 0 {
                return Err(ConfigError::InvalidBackoff(
                    "initial_backoff_ms must be greater than 0".to_string(),
                ));
            }
            if initial_backoff_ms > max_backoff_ms {
                return Err(ConfigError::InvalidBackoff(format!(
                    "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                    initial_backoff_ms, max_backoff_ms
                )));
            }
        }

        Ok(())
    }

    /// Format the date part of `now` with the configured format
    pub fn render_date(&self, now: &NaiveDateTime) -> Result<String, ConfigError> {
        let mut date = String::new();
        write!(date, "{}", now.format(&self.date_format))
            .map_err(|_| ConfigError::InvalidDateFormat(self.date_format.clone()))?;
        Ok(date)
    }

    pub fn recorded_interval(&self) -> Duration {
        Duration::from_millis(self.recorded_interval_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}
