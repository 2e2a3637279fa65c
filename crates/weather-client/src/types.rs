//! Open-Meteo Response Types

use serde::{Deserialize, Serialize};

/// Current conditions as reported in `current_weather`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Air temperature at 2m (°C)
    pub temperature: f64,
    /// Wind speed at 10m (km/h)
    pub windspeed: f64,
}

/// The subset of the forecast response we care about
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub current_weather: CurrentWeather,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_extra_fields() {
        let body = r#"{
            "latitude": 48.14,
            "longitude": 11.58,
            "timezone": "Europe/Berlin",
            "current_weather": {
                "temperature": 17.3,
                "windspeed": 9.4,
                "winddirection": 250,
                "weathercode": 3,
                "time": "2024-01-01T10:00"
            }
        }"#;

        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.current_weather.temperature, 17.3);
        assert_eq!(response.current_weather.windspeed, 9.4);
    }

    #[test]
    fn test_decode_requires_current_weather() {
        let body = r#"{"latitude": 48.14, "longitude": 11.58}"#;
        assert!(serde_json::from_str::<ForecastResponse>(body).is_err());
    }
}
