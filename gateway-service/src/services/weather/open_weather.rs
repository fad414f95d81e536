//! OpenWeatherMap provider implementation.
//!
//! Combines the current-conditions endpoint with the 5-day/3-hour forecast,
//! aggregated into one entry per calendar day.

use super::{WeatherError, WeatherObservation, WeatherProvider};
use crate::dtos::{CurrentConditions, DailyForecast};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: std::time::Duration,
}

pub struct OpenWeatherProvider {
    config: OpenWeatherConfig,
    client: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: OpenWeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WeatherError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        lat: f64,
        lon: f64,
    ) -> Result<T, WeatherError> {
        let url = format!(
            "{}{}?lat={}&lon={}&units=metric&appid={}",
            self.config.base_url, path, lat, lon, self.config.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WeatherError::ApiError(format!(
                "OpenWeatherMap error {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherObservation, WeatherError> {
        tracing::debug!(lat, lon, "Fetching weather from OpenWeatherMap");

        let current: CurrentWeatherResponse = self.get_json("/data/2.5/weather", lat, lon).await?;
        let forecast: ForecastResponse = self.get_json("/data/2.5/forecast", lat, lon).await?;

        let weather = current.weather.first();
        let location_name = match &current.sys.country {
            Some(country) if !current.name.is_empty() => {
                format!("{}, {}", current.name, country)
            }
            _ => current.name.clone(),
        };

        Ok(WeatherObservation {
            location_name,
            current: CurrentConditions {
                temperature: current.main.temp,
                feels_like: current.main.feels_like,
                humidity: current.main.humidity,
                wind_speed: mps_to_kmh(current.wind.speed),
                wind_direction: compass_direction(current.wind.deg.unwrap_or(0.0)),
                rainfall: current.rain.map(|r| r.one_hour.unwrap_or(0.0)).unwrap_or(0.0),
                // Not reported by this endpoint; a second upstream call per
                // request is not worth it for one field.
                uv_index: 0,
                condition: weather
                    .map(|w| w.description.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                condition_icon: weather
                    .map(|w| icon_label(&w.icon))
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            forecast: aggregate_daily(&forecast.list),
        })
    }
}

/// m/s (OpenWeatherMap metric) to km/h.
fn mps_to_kmh(speed: f64) -> f64 {
    speed * 3.6
}

/// Degrees to a 16-point compass label.
pub(crate) fn compass_direction(degrees: f64) -> String {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let normalized = degrees.rem_euclid(360.0);
    let index = ((normalized / 22.5) + 0.5) as usize % 16;
    POINTS[index].to_string()
}

/// OpenWeatherMap icon codes to the client's snake_case labels.
pub(crate) fn icon_label(icon: &str) -> String {
    let label = match icon.get(..2) {
        Some("01") => "clear",
        Some("02") => "partly_cloudy",
        Some("03") | Some("04") => "cloudy",
        Some("09") | Some("10") => "rain",
        Some("11") => "thunderstorm",
        Some("13") => "snow",
        Some("50") => "mist",
        _ => "unknown",
    };
    label.to_string()
}

/// Collapses the 3-hourly forecast list into one entry per calendar day:
/// min/max over the day, the day's worst rain probability, and the first
/// slot's condition as the label.
fn aggregate_daily(slots: &[ForecastSlot]) -> Vec<DailyForecast> {
    let mut days: BTreeMap<NaiveDate, DailyForecast> = BTreeMap::new();

    for slot in slots {
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(slot.dt, 0) else {
            continue;
        };
        let date = timestamp.date_naive();
        let weather = slot.weather.first();

        days.entry(date)
            .and_modify(|day| {
                day.temp_max = day.temp_max.max(slot.main.temp_max);
                day.temp_min = day.temp_min.min(slot.main.temp_min);
                day.rain_chance = day.rain_chance.max(slot.pop.unwrap_or(0.0) * 100.0);
            })
            .or_insert_with(|| DailyForecast {
                date,
                temp_max: slot.main.temp_max,
                temp_min: slot.main.temp_min,
                condition: weather
                    .map(|w| w.description.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                condition_icon: weather
                    .map(|w| icon_label(&w.icon))
                    .unwrap_or_else(|| "unknown".to_string()),
                rain_chance: slot.pop.unwrap_or(0.0) * 100.0,
            });
    }

    days.into_values().collect()
}

// ============================================================================
// OpenWeatherMap Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    name: String,
    main: MainReadings,
    wind: WindReadings,
    #[serde(default)]
    rain: Option<RainReadings>,
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    #[serde(default)]
    sys: SysReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    #[serde(default)]
    temp_min: f64,
    #[serde(default)]
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: f64,
    #[serde(default)]
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RainReadings {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize, Default)]
struct SysReadings {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    dt: i64,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<WeatherCondition>,
    #[serde(default)]
    pop: Option<f64>,
}
