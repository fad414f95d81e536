//! Mock weather provider for testing.

use super::{WeatherError, WeatherObservation, WeatherProvider};
use crate::dtos::CurrentConditions;
use async_trait::async_trait;

pub struct MockWeatherProvider {
    current: CurrentConditions,
}

impl MockWeatherProvider {
    pub fn new() -> Self {
        Self {
            current: CurrentConditions {
                temperature: 28.5,
                feels_like: 31.2,
                humidity: 65.0,
                wind_speed: 12.5,
                wind_direction: "NW".to_string(),
                rainfall: 0.0,
                uv_index: 6,
                condition: "Partly Cloudy".to_string(),
                condition_icon: "partly_cloudy".to_string(),
            },
        }
    }

    /// Override the reported conditions, e.g. to drive specific advice.
    pub fn with_current(current: CurrentConditions) -> Self {
        Self { current }
    }
}

impl Default for MockWeatherProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn fetch(&self, _lat: f64, _lon: f64) -> Result<WeatherObservation, WeatherError> {
        Ok(WeatherObservation {
            location_name: "New Delhi, IN".to_string(),
            current: self.current.clone(),
            forecast: Vec::new(),
        })
    }
}
