//! Weather Client Error Types

use thiserror::Error;

/// Errors that can occur while fetching the current weather
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Transport failure (DNS, connect, TLS, timeout)
    #[error("Request to weather provider failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with something other than 200
    #[error("Weather provider returned status {0}")]
    Status(u16),

    /// Body did not contain a `current_weather` object
    #[error("Invalid weather response: {0}")]
    Decode(#[from] serde_json::Error),
}
