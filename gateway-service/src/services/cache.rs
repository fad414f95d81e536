//! Shared price cache.
//!
//! The scheduled refresh writes here and `getMarketPrices` reads here.
//! Redis keeps the cache outside process memory, so any instance can
//! serve what any other instance cached.

use crate::dtos::MarketPriceEntry;
use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager};

const PRICE_CACHE_KEY: &str = "market:prices";

#[async_trait]
pub trait PriceCache: Send + Sync {
    async fn get_prices(&self) -> Result<Option<Vec<MarketPriceEntry>>, anyhow::Error>;
    async fn set_prices(
        &self,
        entries: &[MarketPriceEntry],
        ttl_seconds: i64,
    ) -> Result<(), anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisPriceCache {
    manager: ConnectionManager,
}

impl RedisPriceCache {
    pub async fn connect(url: &str) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %url, "Connecting to Redis");
        let client = Client::open(url)?;

        // ConnectionManager reconnects on its own
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self { manager })
    }
}

#[async_trait]
impl PriceCache for RedisPriceCache {
    async fn get_prices(&self) -> Result<Option<Vec<MarketPriceEntry>>, anyhow::Error> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(PRICE_CACHE_KEY)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read price cache: {}", e))?;

        match raw {
            Some(json) => {
                let entries = serde_json::from_str(&json)
                    .map_err(|e| anyhow::anyhow!("Corrupt price cache entry: {}", e))?;
                Ok(Some(entries))
            }
            None => Ok(None),
        }
    }

    async fn set_prices(
        &self,
        entries: &[MarketPriceEntry],
        ttl_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let json = serde_json::to_string(entries)?;

        redis::cmd("SET")
            .arg(PRICE_CACHE_KEY)
            .arg(json)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write price cache: {}", e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-memory stand-in for tests.
pub struct InMemoryPriceCache {
    entries: std::sync::Mutex<Option<Vec<MarketPriceEntry>>>,
}

impl InMemoryPriceCache {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(None),
        }
    }
}

impl Default for InMemoryPriceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceCache for InMemoryPriceCache {
    async fn get_prices(&self) -> Result<Option<Vec<MarketPriceEntry>>, anyhow::Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Price cache mutex poisoned: {}", e))?
            .clone();
        Ok(entries)
    }

    async fn set_prices(
        &self,
        entries: &[MarketPriceEntry],
        _ttl_seconds: i64,
    ) -> Result<(), anyhow::Error> {
        *self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Price cache mutex poisoned: {}", e))? =
            Some(entries.to_vec());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
