//! SQLite-backed cache for gold market data: per-interval bar tables with
//! replace-on-conflict merges, a fingerprint-keyed news table with
//! insert-or-ignore merges, and an append-only fetch-outcome audit log.
//! The unique keys here are the correctness backstop for idempotent
//! ingestion; everything above this crate can be re-run freely.

mod articles;
mod bars;
mod db;
mod outcomes;

pub use articles::{ArticleFilter, NewsSummary};
pub use bars::IntervalSummary;
pub use db::CacheDb;

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamps are stored as fixed-width UTC RFC 3339 text so that SQLite's
/// lexicographic MIN/MAX agree with chronological order.
pub(crate) fn ts_to_db(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn ts_from_db(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow::anyhow!("bad timestamp {:?} in store: {}", raw, e))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 11, 14, 9, 30, 0).unwrap();
        assert_eq!(ts_to_db(ts), "2024-11-14T09:30:00Z");
        assert_eq!(ts_from_db("2024-11-14T09:30:00Z").unwrap(), ts);
    }

    #[test]
    fn stored_timestamps_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 11, 14, 9, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 11, 14, 10, 0, 0).unwrap();
        assert!(ts_to_db(earlier) < ts_to_db(later));
    }
}
