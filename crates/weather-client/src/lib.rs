//! Open-Meteo Weather Client
//!
//! This crate fetches the current weather for a fixed location from the
//! Open-Meteo forecast API.

mod client;
mod error;
mod types;

pub use client::{OpenMeteoClient, WeatherConfig};
pub use error::WeatherError;
pub use types::{CurrentWeather, ForecastResponse};

/// Open-Meteo defaults
pub mod defaults {
    /// Forecast endpoint
    pub const BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
    /// Latitude of the tracked location (Munich)
    pub const LATITUDE: f64 = 48.135125;
    /// Longitude of the tracked location (Munich)
    pub const LONGITUDE: f64 = 11.581981;
}
