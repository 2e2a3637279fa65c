//! Application settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! config file, then `WEATHER_RECORDER_*` environment variables.

use alerting::AlertConfig;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use scheduler::PollerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use weather_client::WeatherConfig;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "WEATHER_RECORDER_CONFIG";

/// Config file looked up in the working directory when no path is given
const DEFAULT_CONFIG_FILE: &str = "weather-recorder";

const ENV_PREFIX: &str = "WEATHER_RECORDER";

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid poller configuration: {0}")]
    Poller(#[from] scheduler::ConfigError),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// SQLite database URL
    pub database_url: String,
    pub log_format: LogFormat,
    pub weather: WeatherConfig,
    pub poller: PollerConfig,
    pub alerting: AlertConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:80".to_string(),
            database_url: "sqlite://database.db".to_string(),
            log_format: LogFormat::Pretty,
            weather: WeatherConfig::default(),
            poller: PollerConfig::default(),
            alerting: AlertConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the config file (if any) and the environment
    pub fn load() -> Result<Self, SettingsError> {
        let file = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => File::with_name(&path).required(true),
            Err(_) => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::from_builder(config::Config::builder().add_source(file), environment())
    }

    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        env: Environment,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.poller.validate()?;
        Ok(settings)
    }
}

/// `WEATHER_RECORDER_*` variables; nested keys use `__`, hour lists use commas
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("poller.recording_hours")
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use scheduler::FailurePolicy;
    use std::collections::{BTreeSet, HashMap};

    fn from_toml(toml: &str) -> Result<Settings, SettingsError> {
        from_toml_and_env(toml, &[])
    }

    fn from_toml_and_env(toml: &str, vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Settings::from_builder(
            config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
            environment().source(Some(vars)),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = from_toml("").unwrap();

        assert_eq!(settings.listen_addr, "0.0.0.0:80");
        assert_eq!(settings.poller.recording_hours, BTreeSet::from([10, 15, 21]));
        assert_eq!(settings.poller.date_format, "%Y-%m-%d");
        assert_eq!(settings.weather.latitude, 48.135125);
        assert!(settings.alerting.webhook_url.is_none());
    }

    #[test]
    fn test_file_overrides() {
        let settings = from_toml(
            r#"
            listen_addr = "127.0.0.1:8080"
            log_format = "json"

            [weather]
            latitude = 52.52
            longitude = 13.405

            [poller]
            recording_hours = [7, 19]
            recorded_interval_ms = 300000

            [poller.failure_policy]
            mode = "retry"
            initial_backoff_ms = 1000
            max_backoff_ms = 60000

            [alerting]
            webhook_url = "https://example.com/hook"
            "#,
        )
        .unwrap();

        assert_eq!(settings.listen_addr, "127.0.0.1:8080");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.weather.latitude, 52.52);
        assert_eq!(settings.poller.recording_hours, BTreeSet::from([7, 19]));
        assert_eq!(settings.poller.recorded_interval_ms, 300_000);
        assert_eq!(
            settings.poller.failure_policy,
            FailurePolicy::Retry {
                initial_backoff_ms: 1000,
                max_backoff_ms: 60000,
            }
        );
        assert_eq!(
            settings.alerting.webhook_url.as_deref(),
            Some("https://example.com/hook")
        );
        // Untouched sections keep their defaults
        assert_eq!(settings.poller.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_invalid_hours_rejected() {
        let result = from_toml(
            r#"
            [poller]
            recording_hours = [10, 25]
            "#,
        );

        assert!(matches!(
            result,
            Err(SettingsError::Poller(scheduler::ConfigError::InvalidHour(25)))
        ));
    }

    #[test]
    fn test_environment_overrides_file() {
        let settings = from_toml_and_env(
            r#"
            listen_addr = "127.0.0.1:8080"

            [poller]
            recording_hours = [10]
            "#,
            &[
                ("WEATHER_RECORDER_LISTEN_ADDR", "0.0.0.0:9090"),
                ("WEATHER_RECORDER_POLLER__RECORDING_HOURS", "7,19"),
                ("WEATHER_RECORDER_POLLER__RECORDED_INTERVAL_MS", "120000"),
                ("WEATHER_RECORDER_WEATHER__LATITUDE", "52.52"),
                ("WEATHER_RECORDER_ALERTING__WEBHOOK_URL", "https://example.com/hook"),
                ("UNRELATED_LISTEN_ADDR", "ignored"),
            ],
        )
        .unwrap();

        assert_eq!(settings.listen_addr, "0.0.0.0:9090");
        assert_eq!(settings.poller.recording_hours, BTreeSet::from([7, 19]));
        assert_eq!(settings.poller.recorded_interval_ms, 120_000);
        assert_eq!(settings.weather.latitude, 52.52);
        assert_eq!(
            settings.alerting.webhook_url.as_deref(),
            Some("https://example.com/hook")
        );
    }

    #[test]
    fn test_environment_hours_are_validated() {
        let result = from_toml_and_env("", &[("WEATHER_RECORDER_POLLER__RECORDING_HOURS", "10,30")]);

        assert!(matches!(
            result,
            Err(SettingsError::Poller(scheduler::ConfigError::InvalidHour(30)))
        ));
    }
}
