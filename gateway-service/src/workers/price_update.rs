//! Scheduled mandi price refresh.
//!
//! A single task fires on the configured cron expression (default 06:00
//! in the configured UTC offset), fetches all prices from the source, and
//! writes the derived entries to the shared cache for `getMarketPrices`
//! to serve synchronously. The refresh is awaited on the timer task
//! itself, so runs can never overlap; a failed run is logged and the next
//! occurrence is armed regardless.

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use service_core::error::AppError;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ScheduleConfig;
use crate::services::cache::PriceCache;
use crate::services::market::{MarketDataSource, build_price_entries};

pub struct PriceUpdateWorker {
    schedule: Schedule,
    utc_offset: FixedOffset,
    market: Arc<dyn MarketDataSource>,
    cache: Arc<dyn PriceCache>,
    cache_ttl_seconds: i64,
    shutdown: CancellationToken,
}

impl PriceUpdateWorker {
    pub fn new(
        config: &ScheduleConfig,
        cache_ttl_seconds: i64,
        market: Arc<dyn MarketDataSource>,
        cache: Arc<dyn PriceCache>,
        shutdown: CancellationToken,
    ) -> Result<Self, AppError> {
        let schedule = Schedule::from_str(&config.price_update_cron).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid cron expression '{}': {}",
                config.price_update_cron,
                e
            ))
        })?;
        let utc_offset =
            FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Invalid UTC offset: {} minutes",
                    config.utc_offset_minutes
                ))
            })?;

        Ok(Self {
            schedule,
            utc_offset,
            market,
            cache,
            cache_ttl_seconds,
            shutdown,
        })
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        tracing::info!(
            offset_minutes = self.utc_offset.local_minus_utc() / 60,
            "Price update worker started"
        );

        loop {
            let Some(delay) = self.delay_until_next_tick(Utc::now()) else {
                tracing::warn!("Cron schedule yields no further occurrences; worker exiting");
                break;
            };

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Price update worker shutting down");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    match self.refresh().await {
                        Ok(count) => {
                            tracing::info!(count, "Scheduled price update completed");
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "Scheduled price update failed; retrying on the next tick"
                            );
                        }
                    }
                }
            }
        }
    }

    fn delay_until_next_tick(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let local = now.with_timezone(&self.utc_offset);
        let next = self.schedule.after(&local).next()?;
        (next - local).to_std().ok()
    }

    /// One refresh pass; also callable directly for catch-up at startup.
    pub async fn refresh(&self) -> Result<usize, AppError> {
        let quotes = self
            .market
            .fetch_prices()
            .await
            .map_err(|e| AppError::Upstream(format!("Market data source failed: {e}")))?;

        // The outgoing snapshot supplies the previous prices; without it
        // the new entries report a stable trend.
        let previous = match self.cache.get_prices().await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read prior snapshot; treating as empty");
                None
            }
        };

        let entries = build_price_entries(quotes, previous.as_deref(), Utc::now());
        self.cache
            .set_prices(&entries, self.cache_ttl_seconds)
            .await
            .map_err(AppError::CacheError)?;

        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn worker_config() -> ScheduleConfig {
        ScheduleConfig {
            price_update_cron: "0 0 6 * * *".to_string(),
            utc_offset_minutes: 330,
        }
    }

    #[test]
    fn next_tick_lands_at_six_local() {
        let schedule = Schedule::from_str(&worker_config().price_update_cron).unwrap();
        let offset = FixedOffset::east_opt(330 * 60).unwrap();

        // 2026-08-07 01:00 UTC = 06:30 IST, so the next tick is 06:00 IST
        // the following day.
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 1, 0, 0).unwrap();
        let next = schedule.after(&now.with_timezone(&offset)).next().unwrap();
        assert_eq!(next.hour(), 6);
        assert_eq!(next.minute(), 0);
        assert!(next.with_timezone(&Utc) > now);
    }

    #[test]
    fn invalid_cron_is_rejected() {
        let config = ScheduleConfig {
            price_update_cron: "not a cron".to_string(),
            utc_offset_minutes: 330,
        };
        let result = PriceUpdateWorker::new(
            &config,
            60,
            Arc::new(crate::services::market::mock::MockMarketSource::new()),
            Arc::new(crate::services::cache::InMemoryPriceCache::new()),
            CancellationToken::new(),
        );
        assert!(result.is_err());
    }
}
