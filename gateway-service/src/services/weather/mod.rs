//! Weather provider abstraction.

pub mod mock;
pub mod open_weather;

use async_trait::async_trait;
use thiserror::Error;

use crate::dtos::{CurrentConditions, DailyForecast};

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Everything a provider reports for one location lookup.
pub struct WeatherObservation {
    pub location_name: String,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherObservation, WeatherError>;
}
