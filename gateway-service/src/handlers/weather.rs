//! Handler for the weather + farming advice operation.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use service_core::error::AppError;

use crate::dtos::WeatherReport;
use crate::services::advice::derive_advice;
use crate::startup::AppState;

/// Fallback location when coordinates are absent or unparsable: New Delhi.
pub const DEFAULT_LATITUDE: f64 = 28.6139;
pub const DEFAULT_LONGITUDE: f64 = 77.2090;

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    // Kept as strings so a malformed value falls back instead of 400ing.
    lat: Option<String>,
    lon: Option<String>,
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<WeatherReport>, AppError> {
    let latitude = parse_coordinate(params.lat.as_deref()).unwrap_or(DEFAULT_LATITUDE);
    let longitude = parse_coordinate(params.lon.as_deref()).unwrap_or(DEFAULT_LONGITUDE);

    let observation = state
        .weather
        .fetch(latitude, longitude)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, latitude, longitude, "Weather upstream failed");
            AppError::Upstream("Failed to fetch weather data".to_string())
        })?;

    let advice = derive_advice(&observation.current);

    Ok(Json(WeatherReport {
        location_name: observation.location_name,
        latitude,
        longitude,
        current: observation.current,
        forecast: observation.forecast,
        advice,
        updated_at: Utc::now(),
    }))
}

fn parse_coordinate(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse().ok()
}
