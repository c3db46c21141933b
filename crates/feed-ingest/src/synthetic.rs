use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_core::{Bar, BarInterval, IngestError, MarketDataProvider, NewsProvider, RawArticle};

/// Deterministic stand-in for the upstream provider, used by tests and by
/// mock-mode runs. Selected by the caller; core logic never branches on it.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticProvider {
    base_price: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self { base_price: 2000.0 }
    }
}

impl SyntheticProvider {
    pub fn with_base_price(base_price: f64) -> Self {
        Self { base_price }
    }
}

const NEWS_TEMPLATES: &[(&str, &str)] = &[
    (
        "{sym} rallies as gold prices surge",
        "Strong momentum lifts the precious metals sector.",
    ),
    (
        "Federal Reserve decision weighs on {sym}",
        "Interest rate path remains uncertain ahead of the meeting.",
    ),
    (
        "Mine supply disruptions support {sym}",
        "Production cuts tighten the bullion market.",
    ),
    (
        "{sym} drops amid dollar strength",
        "Bearish pressure builds as yields climb.",
    ),
    (
        "Geopolitical tensions drive safe-haven demand for {sym}",
        "Investors rotate into gold as crisis hedging returns.",
    ),
];

#[async_trait]
impl MarketDataProvider for SyntheticProvider {
    async fn fetch_bars(
        &self,
        _symbol: &str,
        interval: BarInterval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, IngestError> {
        let step = interval.step().num_seconds();
        let fetched_at = Utc::now();

        // Align up to the next bar boundary so generated series line up
        // across overlapping windows.
        let mut ts = start.timestamp();
        let rem = ts.rem_euclid(step);
        if rem != 0 {
            ts += step - rem;
        }

        let mut bars = Vec::new();
        while ts <= end.timestamp() {
            let slot = ts / step;
            let drift = ((slot % 17) - 8) as f64 * 0.75;
            let open = self.base_price + drift;
            let close = open + ((slot % 5) - 2) as f64 * 0.4;

            bars.push(Bar {
                timestamp: DateTime::from_timestamp(ts, 0).unwrap_or(start),
                open,
                high: open.max(close) + 1.5,
                low: open.min(close) - 1.5,
                close,
                volume: 5_000 + (slot % 23) * 100,
                fetched_at,
            });

            ts += step;
        }

        Ok(bars)
    }
}

#[async_trait]
impl NewsProvider for SyntheticProvider {
    async fn fetch_news(
        &self,
        symbol: &str,
        max_results: u32,
    ) -> Result<Vec<RawArticle>, IngestError> {
        let now = Utc::now();

        Ok(NEWS_TEMPLATES
            .iter()
            .take(max_results as usize)
            .enumerate()
            .map(|(i, (title, summary))| RawArticle {
                title: title.replace("{sym}", symbol),
                summary: summary.to_string(),
                link: format!("https://news.example.com/{}/{}", symbol.to_lowercase(), i),
                publisher: "Example Wire".to_string(),
                published_at: Some(now - chrono::Duration::hours(i as i64 + 1)),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 14, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn bars_are_aligned_and_bounded() {
        let provider = SyntheticProvider::default();
        let bars = provider
            .fetch_bars("GC=F", BarInterval::M15, t(9, 7), t(10, 0))
            .await
            .unwrap();

        assert_eq!(bars.first().unwrap().timestamp, t(9, 15));
        assert_eq!(bars.last().unwrap().timestamp, t(10, 0));
        for bar in &bars {
            assert!(bar.low <= bar.open && bar.open <= bar.high);
            assert!(bar.low <= bar.close && bar.close <= bar.high);
        }
    }

    #[tokio::test]
    async fn bars_are_deterministic_across_calls() {
        let provider = SyntheticProvider::default();
        let a = provider
            .fetch_bars("GC=F", BarInterval::M30, t(9, 0), t(12, 0))
            .await
            .unwrap();
        let b = provider
            .fetch_bars("GC=F", BarInterval::M30, t(9, 0), t(12, 0))
            .await
            .unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.timestamp, y.timestamp);
            assert_eq!(x.close, y.close);
        }
    }

    #[tokio::test]
    async fn news_respects_max_results() {
        let provider = SyntheticProvider::default();
        let articles = provider.fetch_news("GLD", 2).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles[0].title.contains("GLD"));
        assert_ne!(articles[0].link, articles[1].link);
    }
}
