//! Shared test harness: spawns the gateway on a random port with mock
//! upstreams injected, mirroring production wiring minus the network.

use gateway_service::config::{
    GatewayConfig, GoogleConfig, MarketConfig, MongoConfig, RedisConfig, ScheduleConfig,
    WeatherConfig,
};
use gateway_service::services::cache::InMemoryPriceCache;
use gateway_service::services::market::mock::MockMarketSource;
use gateway_service::services::providers::mock::MockGenerativeProvider;
use gateway_service::services::sync::InMemorySyncStore;
use gateway_service::services::weather::mock::MockWeatherProvider;
use gateway_service::startup::{AppState, Application};
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        common: service_core::config::Config { port: 0 },
        google: GoogleConfig {
            api_key: "test-api-key".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            vision_model: "gemini-2.0-flash".to_string(),
            timeout_seconds: 5,
        },
        weather: WeatherConfig {
            api_key: "test-api-key".to_string(),
            base_url: "http://localhost:0".to_string(),
            timeout_seconds: 5,
        },
        market: MarketConfig {
            api_key: "test-api-key".to_string(),
            base_url: "http://localhost:0".to_string(),
            resource_id: "test-resource".to_string(),
            timeout_seconds: 5,
            cache_ttl_seconds: 3600,
        },
        redis: RedisConfig {
            url: "redis://localhost:6379".to_string(),
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "gateway_test_db".to_string(),
        },
        schedule: ScheduleConfig {
            price_update_cron: "0 0 6 * * *".to_string(),
            utc_offset_minutes: 330,
        },
    }
}

pub fn test_state() -> AppState {
    AppState {
        config: test_config(),
        generative: Arc::new(MockGenerativeProvider::new()),
        weather: Arc::new(MockWeatherProvider::new()),
        market: Arc::new(MockMarketSource::new()),
        price_cache: Arc::new(InMemoryPriceCache::new()),
        sync_store: Arc::new(InMemorySyncStore::new()),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_state(test_state()).await
}

pub async fn spawn_app_with_state(state: AppState) -> TestApp {
    let app = Application::with_state(state.clone())
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    TestApp {
        address: format!("http://localhost:{}", port),
        client: reqwest::Client::new(),
        state,
    }
}
