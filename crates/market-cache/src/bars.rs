use anyhow::Result;
use chrono::{DateTime, Utc};
use ingest_core::{Bar, BarInterval};

use crate::db::CacheDb;
use crate::{ts_from_db, ts_to_db};

/// Cache summary for one interval table.
#[derive(Debug, Clone)]
pub struct IntervalSummary {
    pub interval: BarInterval,
    pub records: i64,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub latest_close: f64,
}

#[derive(sqlx::FromRow)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    fetched_at: String,
}

impl BarRow {
    fn into_bar(self) -> Result<Bar> {
        Ok(Bar {
            timestamp: ts_from_db(&self.timestamp)?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            fetched_at: ts_from_db(&self.fetched_at)?,
        })
    }
}

impl CacheDb {
    /// Merge bars into the interval table. Replace-on-conflict: if the
    /// provider later returns corrected values for a cached timestamp, the
    /// newer fetch wins. The whole batch commits atomically.
    pub async fn upsert_bars(&self, interval: BarInterval, bars: &[Bar]) -> Result<u64> {
        if bars.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "INSERT OR REPLACE INTO {}
             (timestamp, open, high, low, close, volume, fetched_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            interval.table_name()
        );

        let mut tx = self.pool().begin().await?;
        for bar in bars {
            sqlx::query(&sql)
                .bind(ts_to_db(bar.timestamp))
                .bind(bar.open)
                .bind(bar.high)
                .bind(bar.low)
                .bind(bar.close)
                .bind(bar.volume)
                .bind(ts_to_db(bar.fetched_at))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!("Merged {} bars into {}", bars.len(), interval.table_name());
        Ok(bars.len() as u64)
    }

    /// Observed coverage window for an interval: (MIN, MAX) of cached
    /// timestamps, or `None` for an empty table. Derived on every call,
    /// never stored.
    pub async fn coverage(
        &self,
        interval: BarInterval,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let (min, max): (Option<String>, Option<String>) = sqlx::query_as(&format!(
            "SELECT MIN(timestamp), MAX(timestamp) FROM {}",
            interval.table_name()
        ))
        .fetch_one(self.pool())
        .await?;

        match (min, max) {
            (Some(min), Some(max)) => Ok(Some((ts_from_db(&min)?, ts_from_db(&max)?))),
            _ => Ok(None),
        }
    }

    /// Cached bars inside the closed interval, ascending by timestamp.
    pub async fn bars_in_range(
        &self,
        interval: BarInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let rows = sqlx::query_as::<_, BarRow>(&format!(
            "SELECT timestamp, open, high, low, close, volume, fetched_at
             FROM {}
             WHERE timestamp >= ? AND timestamp <= ?
             ORDER BY timestamp",
            interval.table_name()
        ))
        .bind(ts_to_db(start))
        .bind(ts_to_db(end))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(BarRow::into_bar).collect()
    }

    /// Record count, date range and latest close for one interval table.
    pub async fn interval_summary(&self, interval: BarInterval) -> Result<Option<IntervalSummary>> {
        let row: Option<(i64, Option<String>, Option<String>, Option<f64>)> =
            sqlx::query_as(&format!(
                "SELECT COUNT(*), MIN(timestamp), MAX(timestamp),
                        (SELECT close FROM {table} ORDER BY timestamp DESC LIMIT 1)
                 FROM {table}",
                table = interval.table_name()
            ))
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some((records, Some(first), Some(last), Some(latest_close))) if records > 0 => {
                Ok(Some(IntervalSummary {
                    interval,
                    records,
                    first: ts_from_db(&first)?,
                    last: ts_from_db(&last)?,
                    latest_close,
                }))
            }
            _ => Ok(None),
        }
    }
}
