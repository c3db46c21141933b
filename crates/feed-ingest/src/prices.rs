use anyhow::Result;
use chrono::{DateTime, Utc};
use ingest_core::{BarInterval, FetchOutcome, IngestError, MarketDataProvider};
use market_cache::CacheDb;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::gap::GapResolver;
use crate::report::{CycleReport, UnitReport};
use crate::retry::with_retry;

/// Drives one price fetch cycle per interval:
/// IDLE → RESOLVING → FETCHING → MERGING → DONE.
///
/// Each resolved sub-window is a unit: it fetches through the retry
/// controller, merges with replace-on-conflict, and records its own
/// outcome. A failing unit is logged and skipped, never aborting the rest
/// of the cycle.
pub struct PriceIngestor {
    provider: Arc<dyn MarketDataProvider>,
    db: CacheDb,
    symbol: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl PriceIngestor {
    pub fn new(provider: Arc<dyn MarketDataProvider>, db: CacheDb, config: &SyncConfig) -> Self {
        Self {
            provider,
            db,
            symbol: config.symbol.clone(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        }
    }

    /// Run one cycle for `interval` over the closed request window.
    /// Returns Err only when the store itself is unusable; upstream
    /// failures degrade to failed units inside the report.
    pub async fn run_cycle(
        &self,
        interval: BarInterval,
        requested_start: DateTime<Utc>,
        requested_end: DateTime<Utc>,
    ) -> Result<CycleReport> {
        let feed_id = format!("bars_{}", interval.label());
        let mut report = CycleReport::new(&feed_id);

        let coverage = self.db.coverage(interval).await?;
        let windows =
            GapResolver::for_interval(interval).resolve(coverage, requested_start, requested_end);

        if windows.is_empty() {
            tracing::info!("{}: requested window fully cached", feed_id);
            self.db
                .record_outcome(&FetchOutcome::success(&feed_id, 0))
                .await?;
            report.units.push(UnitReport {
                unit: feed_id.clone(),
                fetched: 0,
                new_rows: 0,
                succeeded: true,
                error: None,
            });
            return Ok(report);
        }

        for (start, end) in windows {
            let unit = format!(
                "{}:{}..{}",
                feed_id,
                start.format("%Y-%m-%dT%H:%M"),
                end.format("%Y-%m-%dT%H:%M")
            );

            match self.ingest_window(interval, start, end).await {
                Ok((fetched, new_rows)) => {
                    tracing::info!("{}: merged {} bars ({} fetched)", unit, new_rows, fetched);
                    self.db
                        .record_outcome(&FetchOutcome::success(&feed_id, new_rows as i64))
                        .await?;
                    report.units.push(UnitReport {
                        unit,
                        fetched,
                        new_rows,
                        succeeded: true,
                        error: None,
                    });
                }
                Err(err) => {
                    tracing::warn!("{}: unit failed: {}", unit, err);
                    self.db
                        .record_outcome(&FetchOutcome::failure(&feed_id, err.to_string()))
                        .await?;
                    report.units.push(UnitReport {
                        unit,
                        fetched: 0,
                        new_rows: 0,
                        succeeded: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn ingest_window(
        &self,
        interval: BarInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(usize, u64), IngestError> {
        let bars = with_retry(
            &format!("bars_{}", interval.label()),
            self.max_retries,
            self.retry_base_delay,
            || self.provider.fetch_bars(&self.symbol, interval, start, end),
        )
        .await?;

        let new_rows = self
            .db
            .upsert_bars(interval, &bars)
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;

        Ok((bars.len(), new_rows))
    }
}
