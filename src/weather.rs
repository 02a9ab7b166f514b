//! Weather lookup seam
//!
//! The scorer only needs four current-condition values. Fetching them is a
//! collaborator concern: implement [`WeatherProvider`] over whatever HTTP
//! client the host application uses. [`OpenMeteo`] supplies the request URL
//! and response decoding for the Open-Meteo forecast API.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RhythmError};
use crate::models::WeatherConditions;

/// Geographic position used for weather lookups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Location {
    /// London
    fn default() -> Self {
        Self {
            latitude: 51.5074,
            longitude: -0.1278,
        }
    }
}

/// Source of current weather conditions
pub trait WeatherProvider {
    fn current(&self, location: Location) -> Result<WeatherConditions>;
}

/// Provider that never has data; the scorer falls back to defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeather;

impl WeatherProvider for NoWeather {
    fn current(&self, _location: Location) -> Result<WeatherConditions> {
        Ok(WeatherConditions::default())
    }
}

/// Fixed conditions, for tests and offline use
#[derive(Debug, Clone, Default)]
pub struct StaticWeather(pub WeatherConditions);

impl WeatherProvider for StaticWeather {
    fn current(&self, _location: Location) -> Result<WeatherConditions> {
        Ok(self.0.clone())
    }
}

/// Look up weather, absorbing any failure
///
/// Errors are logged and replaced with empty conditions so the caller can
/// always compute a score.
pub fn resolve_weather<P: WeatherProvider + ?Sized>(
    provider: &P,
    location: Location,
) -> WeatherConditions {
    match provider.current(location) {
        Ok(conditions) => conditions,
        Err(err) => {
            tracing::warn!(
                latitude = location.latitude,
                longitude = location.longitude,
                error = %err,
                "Failed to fetch weather, using defaults"
            );
            WeatherConditions::default()
        }
    }
}

/// Open-Meteo forecast API helpers
pub struct OpenMeteo;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: CurrentBlock,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    dew_point_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    pressure_msl: Option<f64>,
}

impl OpenMeteo {
    pub const BASE_URL: &'static str = "https://api.open-meteo.com/v1/forecast";

    /// Request URL for current conditions at `location`
    pub fn forecast_url(location: Location) -> String {
        format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,dew_point_2m,relative_humidity_2m,pressure_msl",
            Self::BASE_URL,
            location.latitude,
            location.longitude
        )
    }

    /// Decode a forecast response body
    pub fn parse_current(body: &str) -> Result<WeatherConditions> {
        let response: ForecastResponse = serde_json::from_str(body)
            .map_err(|e| RhythmError::Weather(format!("invalid forecast payload: {}", e)))?;
        let current = response.current;

        Ok(WeatherConditions {
            temperature: current.temperature_2m,
            dew_point: current.dew_point_2m,
            humidity: current.relative_humidity_2m,
            pressure: current.pressure_msl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    impl WeatherProvider for FailingProvider {
        fn current(&self, _location: Location) -> Result<WeatherConditions> {
            Err(RhythmError::Weather("timeout".to_string()))
        }
    }

    #[test]
    fn test_forecast_url() {
        let url = OpenMeteo::forecast_url(Location::default());
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=51.5074"));
        assert!(url.contains("longitude=-0.1278"));
        assert!(url.ends_with("relative_humidity_2m,pressure_msl"));
    }

    #[test]
    fn test_parse_current() {
        let body = r#"{
            "latitude": 51.5,
            "current": {
                "time": "2024-06-20T07:00",
                "temperature_2m": 17.4,
                "dew_point_2m": 11.2,
                "relative_humidity_2m": 67,
                "pressure_msl": 1009.8
            }
        }"#;
        let weather = OpenMeteo::parse_current(body).unwrap();

        assert_eq!(weather.temperature, Some(17.4));
        assert_eq!(weather.dew_point, Some(11.2));
        assert_eq!(weather.humidity, Some(67.0));
        assert_eq!(weather.pressure, Some(1009.8));
    }

    #[test]
    fn test_parse_partial_and_missing_block() {
        let weather = OpenMeteo::parse_current(r#"{"current":{"temperature_2m":3.0}}"#).unwrap();
        assert_eq!(weather.temperature, Some(3.0));
        assert_eq!(weather.pressure, None);

        let weather = OpenMeteo::parse_current("{}").unwrap();
        assert!(weather.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = OpenMeteo::parse_current("<html>").unwrap_err();
        assert!(matches!(err, RhythmError::Weather(_)));
    }

    #[test]
    fn test_failure_is_absorbed() {
        let weather = resolve_weather(&FailingProvider, Location::default());
        assert!(weather.is_empty());
    }

    #[test]
    fn test_static_provider() {
        let fixed = WeatherConditions {
            humidity: Some(80.0),
            ..WeatherConditions::default()
        };
        let weather = resolve_weather(&StaticWeather(fixed.clone()), Location::default());
        assert_eq!(weather, fixed);
        assert!(resolve_weather(&NoWeather, Location::default()).is_empty());
    }
}
