//! Wire payloads for the mandi price operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct MarketPriceList {
    pub prices: Vec<MarketPriceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPriceEntry {
    pub id: String,
    pub crop_name: String,
    pub crop_name_local: String,
    pub mandi_name: String,
    pub mandi_location: String,
    pub state: String,
    pub price_per_quintal: f64,
    pub previous_price: f64,
    pub trend: PriceTrend,
    pub percent_change: f64,
    pub recommendation: TradeRecommendation,
    pub ai_insight: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeRecommendation {
    Buy,
    Sell,
    Hold,
}
