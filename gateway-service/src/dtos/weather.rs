//! Wire payloads for the weather operation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub current: CurrentConditions,
    pub forecast: Vec<DailyForecast>,
    pub advice: FarmingAdvice,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// Degrees Celsius
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    /// 16-point compass label
    pub wind_direction: String,
    /// mm over the last hour
    pub rainfall: f64,
    pub uv_index: u32,
    pub condition: String,
    pub condition_icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub condition: String,
    pub condition_icon: String,
    /// Probability of precipitation, percent
    pub rain_chance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingAdvice {
    pub irrigation: IrrigationAdvice,
    pub spray: SprayAdvice,
    pub general_tips: Vec<String>,
    pub alerts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationAdvice {
    pub should_irrigate: bool,
    pub recommendation: String,
    pub best_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprayAdvice {
    pub is_suitable: bool,
    pub recommendation: String,
    pub best_window: String,
}
