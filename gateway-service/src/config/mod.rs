use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Daily price refresh at 06:00 local (sec min hour day month weekday).
const DEFAULT_PRICE_UPDATE_CRON: &str = "0 0 6 * * *";

/// Asia/Kolkata (+05:30), the deployment's market timezone.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub weather: WeatherConfig,
    pub market: MarketConfig,
    pub redis: RedisConfig,
    pub mongodb: MongoConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub api_key: String,
    /// Model for text generation and chat (e.g., gemini-2.0-flash)
    pub text_model: String,
    /// Model for image diagnosis
    pub vision_model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    pub api_key: String,
    pub base_url: String,
    /// data.gov.in resource id of the daily mandi price feed
    pub resource_id: String,
    pub timeout_seconds: u64,
    /// Cache entries survive a missed refresh tick, hence > 24h
    pub cache_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub price_update_cron: String,
    pub utc_offset_minutes: i32,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(GatewayConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: get_env("GOOGLE_API_KEY", None, is_prod)?,
                text_model: get_env("GATEWAY_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                vision_model: get_env("GATEWAY_VISION_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                timeout_seconds: parse_env("GATEWAY_GENAI_TIMEOUT_SECONDS", 120, is_prod)?,
            },
            weather: WeatherConfig {
                api_key: get_env("OPENWEATHER_API_KEY", None, is_prod)?,
                base_url: get_env(
                    "OPENWEATHER_BASE_URL",
                    Some("https://api.openweathermap.org"),
                    is_prod,
                )?,
                timeout_seconds: parse_env("GATEWAY_WEATHER_TIMEOUT_SECONDS", 30, is_prod)?,
            },
            market: MarketConfig {
                api_key: get_env("DATA_GOV_IN_API_KEY", None, is_prod)?,
                base_url: get_env(
                    "DATA_GOV_IN_BASE_URL",
                    Some("https://api.data.gov.in"),
                    is_prod,
                )?,
                resource_id: get_env(
                    "AGMARKNET_RESOURCE_ID",
                    Some("9ef84268-d588-465a-a308-a864a43d0070"),
                    is_prod,
                )?,
                timeout_seconds: parse_env("GATEWAY_MARKET_TIMEOUT_SECONDS", 30, is_prod)?,
                cache_ttl_seconds: parse_env("GATEWAY_PRICE_CACHE_TTL_SECONDS", 172_800, is_prod)?,
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://localhost:6379"), is_prod)?,
            },
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("gateway_db"), is_prod)?,
            },
            schedule: ScheduleConfig {
                price_update_cron: get_env(
                    "PRICE_UPDATE_CRON",
                    Some(DEFAULT_PRICE_UPDATE_CRON),
                    is_prod,
                )?,
                utc_offset_minutes: parse_env(
                    "SCHEDULE_UTC_OFFSET_MINUTES",
                    DEFAULT_UTC_OFFSET_MINUTES,
                    is_prod,
                )?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr + std::fmt::Display,
{
    let raw = get_env(key, Some(&default.to_string()), is_prod)?;
    raw.parse().map_err(|_| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, raw))
    })
}
