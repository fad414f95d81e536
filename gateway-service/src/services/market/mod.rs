//! Market data source abstraction and price derivation rules.

pub mod agmarknet;
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::dtos::{MarketPriceEntry, PriceTrend, TradeRecommendation};

/// Trend window: changes within this band count as stable (percent).
pub const STABLE_BAND_PCT: f64 = 0.1;
/// Recommendation thresholds (percent change).
pub const SELL_THRESHOLD_PCT: f64 = 5.0;
pub const BUY_THRESHOLD_PCT: f64 = -5.0;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Source not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// One raw price observation from a source, before derivation.
#[derive(Debug, Clone)]
pub struct PriceQuote {
    pub crop_name: String,
    pub mandi_name: String,
    pub mandi_location: String,
    pub state: String,
    pub price_per_quintal: f64,
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_prices(&self) -> Result<Vec<PriceQuote>, MarketError>;
}

/// Stable identifier for a quote, so successive refreshes line up.
pub fn entry_id(quote: &PriceQuote) -> String {
    slug(&format!(
        "{}-{}-{}",
        quote.state, quote.mandi_name, quote.crop_name
    ))
}

fn slug(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn percent_change(price: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (price - previous) / previous * 100.0
}

pub fn trend_for(percent: f64) -> PriceTrend {
    if percent > STABLE_BAND_PCT {
        PriceTrend::Up
    } else if percent < -STABLE_BAND_PCT {
        PriceTrend::Down
    } else {
        PriceTrend::Stable
    }
}

pub fn recommendation_for(percent: f64) -> TradeRecommendation {
    if percent >= SELL_THRESHOLD_PCT {
        TradeRecommendation::Sell
    } else if percent <= BUY_THRESHOLD_PCT {
        TradeRecommendation::Buy
    } else {
        TradeRecommendation::Hold
    }
}

fn insight_for(crop_name: &str, trend: PriceTrend, percent: f64) -> String {
    match trend {
        PriceTrend::Up => format!(
            "{} prices trending upward ({:+.1}%) on recent demand.",
            crop_name, percent
        ),
        PriceTrend::Down => format!(
            "{} prices easing ({:+.1}%); arrivals outpacing demand.",
            crop_name, percent
        ),
        PriceTrend::Stable => format!("{} prices holding steady this week.", crop_name),
    }
}

/// Hindi names for the crops commonly traded through the app; anything
/// unknown falls back to the English name.
pub fn local_crop_name(crop_name: &str) -> String {
    match crop_name.to_lowercase().as_str() {
        "wheat" => "गेहूं",
        "rice" | "paddy" => "चावल",
        "onion" => "प्याज",
        "potato" => "आलू",
        "tomato" => "टमाटर",
        "maize" => "मक्का",
        "cotton" => "कपास",
        "mustard" => "सरसों",
        "soybean" => "सोयाबीन",
        "gram" => "चना",
        _ => return crop_name.to_string(),
    }
    .to_string()
}

/// Derives full price entries from raw quotes. `previous` is the prior
/// cached snapshot; a quote with no prior entry reports a stable price.
pub fn build_price_entries(
    quotes: Vec<PriceQuote>,
    previous: Option<&[MarketPriceEntry]>,
    updated_at: DateTime<Utc>,
) -> Vec<MarketPriceEntry> {
    let previous_by_id: HashMap<&str, f64> = previous
        .unwrap_or_default()
        .iter()
        .map(|e| (e.id.as_str(), e.price_per_quintal))
        .collect();

    quotes
        .into_iter()
        .map(|quote| {
            let id = entry_id(&quote);
            let previous_price = previous_by_id
                .get(id.as_str())
                .copied()
                .unwrap_or(quote.price_per_quintal);
            let percent = percent_change(quote.price_per_quintal, previous_price);
            let trend = trend_for(percent);

            MarketPriceEntry {
                id,
                crop_name_local: local_crop_name(&quote.crop_name),
                ai_insight: insight_for(&quote.crop_name, trend, percent),
                crop_name: quote.crop_name,
                mandi_name: quote.mandi_name,
                mandi_location: quote.mandi_location,
                state: quote.state,
                price_per_quintal: quote.price_per_quintal,
                previous_price,
                trend,
                percent_change: percent,
                recommendation: recommendation_for(percent),
                updated_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(crop: &str, mandi: &str, price: f64) -> PriceQuote {
        PriceQuote {
            crop_name: crop.to_string(),
            mandi_name: mandi.to_string(),
            mandi_location: "Delhi".to_string(),
            state: "Delhi".to_string(),
            price_per_quintal: price,
        }
    }

    #[test]
    fn percent_change_matches_formula() {
        assert!((percent_change(2450.0, 2380.0) - 2.9411764705882353).abs() < 1e-9);
        assert_eq!(percent_change(2450.0, 0.0), 0.0);
    }

    #[test]
    fn trend_bands() {
        assert_eq!(trend_for(0.05), PriceTrend::Stable);
        assert_eq!(trend_for(-0.05), PriceTrend::Stable);
        assert_eq!(trend_for(0.2), PriceTrend::Up);
        assert_eq!(trend_for(-0.2), PriceTrend::Down);
    }

    #[test]
    fn recommendation_thresholds() {
        assert_eq!(recommendation_for(5.0), TradeRecommendation::Sell);
        assert_eq!(recommendation_for(4.9), TradeRecommendation::Hold);
        assert_eq!(recommendation_for(-5.0), TradeRecommendation::Buy);
        assert_eq!(recommendation_for(-4.9), TradeRecommendation::Hold);
    }

    #[test]
    fn entry_ids_are_stable_slugs() {
        let id = entry_id(&quote("Wheat", "Azadpur Mandi", 2450.0));
        assert_eq!(id, "delhi-azadpur-mandi-wheat");
    }

    #[test]
    fn first_snapshot_reports_stable_prices() {
        let entries = build_price_entries(vec![quote("Wheat", "Azadpur Mandi", 2450.0)], None, Utc::now());
        assert_eq!(entries[0].previous_price, 2450.0);
        assert_eq!(entries[0].trend, PriceTrend::Stable);
        assert_eq!(entries[0].percent_change, 0.0);
        assert_eq!(entries[0].recommendation, TradeRecommendation::Hold);
    }

    #[test]
    fn refresh_derives_change_from_prior_snapshot() {
        let now = Utc::now();
        let first = build_price_entries(vec![quote("Wheat", "Azadpur Mandi", 2380.0)], None, now);
        let second =
            build_price_entries(vec![quote("Wheat", "Azadpur Mandi", 2500.0)], Some(&first), now);

        assert_eq!(second[0].previous_price, 2380.0);
        assert_eq!(second[0].trend, PriceTrend::Up);
        assert_eq!(second[0].recommendation, TradeRecommendation::Sell);
        assert!(second[0].ai_insight.contains("upward"));
    }

    #[test]
    fn local_names_cover_common_crops() {
        assert_eq!(local_crop_name("Wheat"), "गेहूं");
        assert_eq!(local_crop_name("Dragonfruit"), "Dragonfruit");
    }
}
