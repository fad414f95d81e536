//! Tests for the scheduled price refresh.

mod common;

use common::test_config;
use gateway_service::services::cache::{InMemoryPriceCache, PriceCache};
use gateway_service::services::market::mock::MockMarketSource;
use gateway_service::workers::PriceUpdateWorker;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn worker(
    market: Arc<MockMarketSource>,
    cache: Arc<InMemoryPriceCache>,
) -> PriceUpdateWorker {
    let config = test_config();
    PriceUpdateWorker::new(
        &config.schedule,
        config.market.cache_ttl_seconds,
        market,
        cache,
        CancellationToken::new(),
    )
    .expect("Failed to build worker")
}

#[tokio::test]
async fn refresh_writes_the_shared_cache() {
    let market = Arc::new(MockMarketSource::new());
    let cache = Arc::new(InMemoryPriceCache::new());

    let count = worker(market, cache.clone()).refresh().await.unwrap();

    assert_eq!(count, 3);
    assert_eq!(cache.get_prices().await.unwrap().unwrap().len(), 3);
}

#[tokio::test]
async fn failed_tick_does_not_prevent_the_next_one() {
    let market = Arc::new(MockMarketSource::failing());
    let cache = Arc::new(InMemoryPriceCache::new());
    let worker = worker(market.clone(), cache.clone());

    // first tick: source is down, nothing cached
    assert!(worker.refresh().await.is_err());
    assert!(cache.get_prices().await.unwrap().is_none());

    // next tick: source recovered, refresh proceeds normally
    market.set_fail(false);
    assert_eq!(worker.refresh().await.unwrap(), 3);
    assert!(cache.get_prices().await.unwrap().is_some());
}

#[tokio::test]
async fn refresh_carries_previous_prices_forward() {
    let market = Arc::new(MockMarketSource::new());
    let cache = Arc::new(InMemoryPriceCache::new());
    let worker = worker(market, cache.clone());

    worker.refresh().await.unwrap();
    let first = cache.get_prices().await.unwrap().unwrap();

    worker.refresh().await.unwrap();
    let second = cache.get_prices().await.unwrap().unwrap();

    // the mock reports fixed prices, so the second snapshot sees the
    // first one's prices as "previous" and stays stable
    for (before, after) in first.iter().zip(second.iter()) {
        assert_eq!(after.previous_price, before.price_per_quintal);
        assert_eq!(after.percent_change, 0.0);
    }
}
