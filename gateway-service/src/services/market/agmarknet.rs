//! Agmarknet mandi price source via the data.gov.in API.

use super::{MarketDataSource, MarketError, PriceQuote};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Page size for the daily feed; one fetch covers the mandis the app serves.
const FETCH_LIMIT: u32 = 500;

#[derive(Debug, Clone)]
pub struct AgmarknetConfig {
    pub api_key: String,
    pub base_url: String,
    pub resource_id: String,
    pub timeout: std::time::Duration,
}

pub struct AgmarknetSource {
    config: AgmarknetConfig,
    client: Client,
}

impl AgmarknetSource {
    pub fn new(config: AgmarknetConfig) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl MarketDataSource for AgmarknetSource {
    async fn fetch_prices(&self) -> Result<Vec<PriceQuote>, MarketError> {
        let url = format!(
            "{}/resource/{}?api-key={}&format=json&limit={}",
            self.config.base_url, self.config.resource_id, self.config.api_key, FETCH_LIMIT
        );

        tracing::debug!(resource = %self.config.resource_id, "Fetching mandi prices from data.gov.in");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MarketError::ApiError(format!(
                "data.gov.in error {}: {}",
                status, error_text
            )));
        }

        let feed: AgmarknetResponse = response
            .json()
            .await
            .map_err(|e| MarketError::ApiError(format!("Failed to parse response: {}", e)))?;

        let quotes = feed
            .records
            .into_iter()
            .filter_map(|record| {
                // The feed reports prices as strings; skip malformed rows
                // rather than failing the whole refresh.
                let price: f64 = record.modal_price.trim().parse().ok()?;
                if price <= 0.0 {
                    return None;
                }
                Some(PriceQuote {
                    crop_name: record.commodity,
                    mandi_name: record.market,
                    mandi_location: record.district,
                    state: record.state,
                    price_per_quintal: price,
                })
            })
            .collect();

        Ok(quotes)
    }
}

#[derive(Debug, Deserialize)]
struct AgmarknetResponse {
    #[serde(default)]
    records: Vec<AgmarknetRecord>,
}

#[derive(Debug, Deserialize)]
struct AgmarknetRecord {
    #[serde(default)]
    state: String,
    #[serde(default)]
    district: String,
    #[serde(default)]
    market: String,
    #[serde(default)]
    commodity: String,
    #[serde(default)]
    modal_price: String,
}
