//! Handler for the mandi price operation.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use service_core::error::AppError;

use crate::dtos::{MarketPriceEntry, MarketPriceList};
use crate::services::market::build_price_entries;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct MarketPriceParams {
    crop: Option<String>,
    state: Option<String>,
}

pub async fn get_market_prices(
    State(state): State<AppState>,
    Query(params): Query<MarketPriceParams>,
) -> Result<Json<MarketPriceList>, AppError> {
    let entries = match state.price_cache.get_prices().await {
        Ok(Some(cached)) => cached,
        Ok(None) => fetch_live(&state).await?,
        Err(e) => {
            tracing::warn!(error = %e, "Price cache unavailable, fetching live");
            fetch_live(&state).await?
        }
    };

    let prices = filter_entries(entries, params.crop.as_deref(), params.state.as_deref());
    Ok(Json(MarketPriceList { prices }))
}

/// Cache miss path: fetch from the source and best-effort repopulate the
/// cache so the next request is served synchronously.
async fn fetch_live(state: &AppState) -> Result<Vec<MarketPriceEntry>, AppError> {
    let quotes = state.market.fetch_prices().await.map_err(|e| {
        tracing::error!(error = %e, "Market data source failed");
        AppError::Upstream("Failed to fetch market prices".to_string())
    })?;

    let entries = build_price_entries(quotes, None, Utc::now());

    if let Err(e) = state
        .price_cache
        .set_prices(&entries, state.config.market.cache_ttl_seconds)
        .await
    {
        tracing::warn!(error = %e, "Failed to repopulate price cache");
    }

    Ok(entries)
}

fn filter_entries(
    entries: Vec<MarketPriceEntry>,
    crop: Option<&str>,
    state: Option<&str>,
) -> Vec<MarketPriceEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            crop.map_or(true, |c| entry.crop_name.eq_ignore_ascii_case(c))
                && state.map_or(true, |s| entry.state.eq_ignore_ascii_case(s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::market::PriceQuote;

    fn entries() -> Vec<MarketPriceEntry> {
        build_price_entries(
            vec![
                PriceQuote {
                    crop_name: "Wheat".to_string(),
                    mandi_name: "Azadpur Mandi".to_string(),
                    mandi_location: "Delhi".to_string(),
                    state: "Delhi".to_string(),
                    price_per_quintal: 2450.0,
                },
                PriceQuote {
                    crop_name: "Onion".to_string(),
                    mandi_name: "Lasalgaon Mandi".to_string(),
                    mandi_location: "Nashik".to_string(),
                    state: "Maharashtra".to_string(),
                    price_per_quintal: 1820.0,
                },
            ],
            None,
            Utc::now(),
        )
    }

    #[test]
    fn filters_are_case_insensitive() {
        let filtered = filter_entries(entries(), Some("wheat"), None);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].crop_name, "Wheat");

        let filtered = filter_entries(entries(), None, Some("MAHARASHTRA"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].state, "Maharashtra");
    }

    #[test]
    fn no_filters_returns_everything() {
        assert_eq!(filter_entries(entries(), None, None).len(), 2);
    }
}
