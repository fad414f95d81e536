//! Mock market data source for testing.

use super::{MarketDataSource, MarketError, PriceQuote};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed quotes; can be toggled to fail to exercise refresh error paths.
pub struct MockMarketSource {
    fail: AtomicBool,
}

impl MockMarketSource {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockMarketSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for MockMarketSource {
    async fn fetch_prices(&self) -> Result<Vec<PriceQuote>, MarketError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MarketError::ApiError("simulated source outage".to_string()));
        }

        Ok(vec![
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
            PriceQuote {
                crop_name: "Rice".to_string(),
                mandi_name: "Karnal Mandi".to_string(),
                mandi_location: "Karnal".to_string(),
                state: "Haryana".to_string(),
                price_per_quintal: 3120.0,
            },
        ])
    }
}
