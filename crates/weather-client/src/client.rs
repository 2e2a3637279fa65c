//! Open-Meteo Client
//!
//! Provides async access to the current weather at a fixed location.

use crate::defaults;
use crate::error::WeatherError;
use crate::types::{CurrentWeather, ForecastResponse};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Weather provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Forecast endpoint without query string
    pub base_url: String,
    /// Latitude of the tracked location
    pub latitude: f64,
    /// Longitude of the tracked location
    pub longitude: f64,
    /// Request timeout in seconds (`None` waits indefinitely)
    pub timeout_secs: Option<u64>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            latitude: defaults::LATITUDE,
            longitude: defaults::LONGITUDE,
            timeout_secs: Some(30),
        }
    }
}

/// Client for the Open-Meteo forecast API
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    url: String,
}

impl OpenMeteoClient {
    /// Create a new client for the configured location
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| WeatherError::Client(e.to_string()))?;

        let url = forecast_url(&config.base_url, config.latitude, config.longitude);
        info!("Weather client targeting {}", url);

        Ok(Self { client, url })
    }

    /// Full request URL, query string included
    pub fn forecast_url(&self) -> &str {
        &self.url
    }

    /// Fetch the current temperature and wind speed
    pub async fn fetch_current(&self) -> Result<CurrentWeather, WeatherError> {
        debug!("Requesting current weather");

        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Weather provider returned {}", status);
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let decoded: ForecastResponse = serde_json::from_slice(&body)?;

        debug!(
            "Current weather: {}°C, wind {} km/h",
            decoded.current_weather.temperature, decoded.current_weather.windspeed
        );
        Ok(decoded.current_weather)
    }
}

fn forecast_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}?latitude={:.6}&longitude={:.6}&current_weather=true&timezone=auto",
        base_url.trim_end_matches('?'),
        latitude,
        longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> WeatherConfig {
        WeatherConfig {
            base_url: format!("{}/v1/forecast", server.uri()),
            ..Default::default()
        }
    }

    #[test]
    fn test_forecast_url() {
        let client = OpenMeteoClient::new(&WeatherConfig::default()).unwrap();
        assert_eq!(
            client.forecast_url(),
            "https://api.open-meteo.com/v1/forecast?latitude=48.135125&longitude=11.581981&current_weather=true&timezone=auto"
        );
    }

    #[tokio::test]
    async fn test_fetch_current() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current_weather", "true"))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 48.14,
                "longitude": 11.58,
                "current_weather": { "temperature": 21.5, "windspeed": 7.2 }
            })))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::new(&config_for(&server)).unwrap();
        let current = client.fetch_current().await.unwrap();

        assert_eq!(current.temperature, 21.5);
        assert_eq!(current.windspeed, 7.2);
    }

    #[tokio::test]
    async fn test_non_ok_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::new(&config_for(&server)).unwrap();
        let err = client.fetch_current().await.unwrap_err();

        assert!(matches!(err, WeatherError::Status(503)));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"hourly\": {}}"))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::new(&config_for(&server)).unwrap();
        let err = client.fetch_current().await.unwrap_err();

        assert!(matches!(err, WeatherError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:1/v1/forecast".to_string(),
            timeout_secs: Some(2),
            ..Default::default()
        };

        let client = OpenMeteoClient::new(&config).unwrap();
        let err = client.fetch_current().await.unwrap_err();

        assert!(matches!(err, WeatherError::Request(_)));
    }
}
