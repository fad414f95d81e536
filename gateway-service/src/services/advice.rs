//! Deterministic farming advice derived from current conditions.
//!
//! Thresholds are the documented contract of the weather endpoint; tests
//! pin the boundaries.

use crate::dtos::{CurrentConditions, FarmingAdvice, IrrigationAdvice, SprayAdvice};

/// Irrigate when recent rainfall is below this (mm)...
pub const IRRIGATION_RAINFALL_MM: f64 = 1.0;
/// ...and humidity is below this (%), a proxy for soil moisture.
pub const IRRIGATION_HUMIDITY_PCT: f64 = 60.0;

/// Spraying is unsuitable above this wind speed (km/h)...
pub const SPRAY_WIND_LIMIT_KMH: f64 = 15.0;
/// ...or at/above this rainfall (mm).
pub const SPRAY_RAINFALL_MM: f64 = 0.5;

pub const HEAT_TIP_C: f64 = 35.0;
pub const DRAINAGE_TIP_MM: f64 = 10.0;

pub const ALERT_RAIN_MM: f64 = 20.0;
pub const ALERT_HEAT_C: f64 = 40.0;
pub const ALERT_WIND_KMH: f64 = 30.0;

pub fn derive_advice(current: &CurrentConditions) -> FarmingAdvice {
    let should_irrigate = current.rainfall < IRRIGATION_RAINFALL_MM
        && current.humidity < IRRIGATION_HUMIDITY_PCT;
    let irrigation = IrrigationAdvice {
        should_irrigate,
        recommendation: if should_irrigate {
            "Soil moisture is low. Irrigate in early morning.".to_string()
        } else {
            "Soil moisture is adequate. Skip irrigation today.".to_string()
        },
        best_time: "6:00 AM - 8:00 AM".to_string(),
    };

    let spray_suitable =
        current.wind_speed <= SPRAY_WIND_LIMIT_KMH && current.rainfall < SPRAY_RAINFALL_MM;
    let spray = SprayAdvice {
        is_suitable: spray_suitable,
        recommendation: if spray_suitable {
            "Weather conditions favorable for spraying.".to_string()
        } else if current.wind_speed > SPRAY_WIND_LIMIT_KMH {
            "Wind too strong for spraying; drift risk.".to_string()
        } else {
            "Rain will wash off spray; wait for a dry window.".to_string()
        },
        best_window: "7:00 AM - 10:00 AM".to_string(),
    };

    let mut general_tips = Vec::new();
    if current.temperature > HEAT_TIP_C {
        general_tips.push("High heat expected; avoid midday field work.".to_string());
    }
    if current.rainfall > DRAINAGE_TIP_MM {
        general_tips.push("Check field drainage after heavy rain.".to_string());
    }
    if general_tips.is_empty() {
        general_tips.push("Good day for field activities".to_string());
    }

    let mut alerts = Vec::new();
    if current.rainfall > ALERT_RAIN_MM {
        alerts.push(format!(
            "Heavy rainfall ({:.1} mm); protect stored produce and seedlings.",
            current.rainfall
        ));
    }
    if current.temperature > ALERT_HEAT_C {
        alerts.push(format!(
            "Extreme heat ({:.1}°C); irrigate in the evening and shade nurseries.",
            current.temperature
        ));
    }
    if current.wind_speed > ALERT_WIND_KMH {
        alerts.push(format!(
            "High winds ({:.1} km/h); secure covers and delay spraying.",
            current.wind_speed
        ));
    }

    FarmingAdvice {
        irrigation,
        spray,
        general_tips,
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(temperature: f64, humidity: f64, wind_speed: f64, rainfall: f64) -> CurrentConditions {
        CurrentConditions {
            temperature,
            feels_like: temperature,
            humidity,
            wind_speed,
            wind_direction: "N".to_string(),
            rainfall,
            uv_index: 5,
            condition: "Clear".to_string(),
            condition_icon: "clear".to_string(),
        }
    }

    #[test]
    fn dry_low_humidity_day_calls_for_irrigation() {
        let advice = derive_advice(&conditions(30.0, 45.0, 10.0, 0.0));
        assert!(advice.irrigation.should_irrigate);
        assert!(advice.spray.is_suitable);
        assert_eq!(advice.general_tips, vec!["Good day for field activities"]);
        assert!(advice.alerts.is_empty());
    }

    #[test]
    fn humid_day_skips_irrigation() {
        let advice = derive_advice(&conditions(30.0, IRRIGATION_HUMIDITY_PCT, 10.0, 0.0));
        assert!(!advice.irrigation.should_irrigate);
    }

    #[test]
    fn rain_suppresses_irrigation() {
        let advice = derive_advice(&conditions(30.0, 45.0, 10.0, IRRIGATION_RAINFALL_MM));
        assert!(!advice.irrigation.should_irrigate);
    }

    #[test]
    fn wind_above_limit_suppresses_spraying() {
        let advice = derive_advice(&conditions(30.0, 45.0, SPRAY_WIND_LIMIT_KMH + 0.1, 0.0));
        assert!(!advice.spray.is_suitable);
        assert!(advice.spray.recommendation.contains("Wind"));
    }

    #[test]
    fn wind_at_limit_still_allows_spraying() {
        let advice = derive_advice(&conditions(30.0, 45.0, SPRAY_WIND_LIMIT_KMH, 0.0));
        assert!(advice.spray.is_suitable);
    }

    #[test]
    fn extreme_conditions_raise_alerts() {
        let advice = derive_advice(&conditions(42.0, 45.0, 35.0, 25.0));
        assert_eq!(advice.alerts.len(), 3);
        assert!(!advice.spray.is_suitable);
        // both heat and drainage tips apply
        assert_eq!(advice.general_tips.len(), 2);
    }
}
