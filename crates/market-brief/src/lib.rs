//! Deterministic, bounded-size text rendering of recent bars and articles.
//! This string is the only contract with the external LLM collaborator:
//! same inputs, same output, size capped by the options.

use ingest_core::{Article, Bar};
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct BriefOptions {
    /// Price history lines included in the block.
    pub max_points: usize,
    /// Headlines included in the news block.
    pub max_headlines: usize,
}

impl Default for BriefOptions {
    fn default() -> Self {
        Self {
            max_points: 20,
            max_headlines: 10,
        }
    }
}

/// Render the full brief: price block plus, when articles are present, a
/// news block.
pub fn render_market_brief(
    interval_label: &str,
    bars: &[Bar],
    articles: &[Article],
    options: &BriefOptions,
) -> String {
    let mut brief = render_price_block(interval_label, bars, options.max_points);
    if !articles.is_empty() {
        brief.push('\n');
        brief.push_str(&render_news_block(articles, options.max_headlines));
    }
    brief
}

/// Price summary, recent history and a trend block, newest first.
pub fn render_price_block(interval_label: &str, bars: &[Bar], max_points: usize) -> String {
    if bars.is_empty() {
        return "No recent market data available.\n".to_string();
    }

    let mut sorted: Vec<&Bar> = bars.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let latest = sorted[0];
    let oldest = sorted[sorted.len() - 1];

    let change = latest.close - oldest.close;
    let change_pct = if oldest.close != 0.0 {
        change / oldest.close * 100.0
    } else {
        0.0
    };

    let high = sorted.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = sorted.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let avg_volume = sorted.iter().map(|b| b.volume).sum::<i64>() as f64 / sorted.len() as f64;

    let mut out = String::new();
    let _ = writeln!(out, "**CURRENT PRICE DATA ({}):**", interval_label);
    let _ = writeln!(out, "- Latest Price: ${:.2}", latest.close);
    let _ = writeln!(out, "- Change: ${:+.2} ({:+.2}%)", change, change_pct);
    let _ = writeln!(out, "- High: ${:.2}", high);
    let _ = writeln!(out, "- Low: ${:.2}", low);
    let _ = writeln!(out, "- Average Volume: {:.0}", avg_volume);
    out.push('\n');
    let _ = writeln!(
        out,
        "**RECENT PRICE HISTORY (last {} points):**",
        sorted.len().min(max_points)
    );

    for bar in sorted.iter().take(max_points) {
        let _ = writeln!(
            out,
            "- {}: O=${:.2} H=${:.2} L=${:.2} C=${:.2} V={}",
            bar.timestamp.format("%Y-%m-%d %H:%M"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        );
    }

    if sorted.len() >= 10 {
        let recent_10: f64 = sorted.iter().take(10).map(|b| b.close).sum::<f64>() / 10.0;
        let older_10: f64 = sorted.iter().rev().take(10).map(|b| b.close).sum::<f64>() / 10.0;
        let direction = if recent_10 > older_10 { "UPWARD" } else { "DOWNWARD" };
        let strength = if older_10 != 0.0 {
            (recent_10 - older_10).abs() / older_10 * 100.0
        } else {
            0.0
        };
        let volatility = if latest.close != 0.0 {
            (high - low) / latest.close * 100.0
        } else {
            0.0
        };

        out.push('\n');
        let _ = writeln!(out, "**TREND ANALYSIS:**");
        let _ = writeln!(out, "- Short-term Trend: {}", direction);
        let _ = writeln!(out, "- Trend Strength: {:.2}%", strength);
        let _ = writeln!(out, "- Volatility: {:.2}%", volatility);
    }

    out
}

/// News digest: average sentiment, category counts and top headlines.
pub fn render_news_block(articles: &[Article], max_headlines: usize) -> String {
    if articles.is_empty() {
        return "No recent news available.\n".to_string();
    }

    let mut sorted: Vec<&Article> = articles.iter().collect();
    sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let avg_sentiment =
        sorted.iter().map(|a| a.sentiment_score).sum::<f64>() / sorted.len() as f64;

    // BTreeMap keeps category ordering stable regardless of input order
    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    for article in &sorted {
        *categories.entry(article.category.as_str()).or_default() += 1;
    }

    let mut out = String::new();
    let _ = writeln!(out, "**NEWS SENTIMENT ({} articles):**", sorted.len());
    let _ = writeln!(out, "- Average Sentiment: {:.3} (-1.0 to 1.0)", avg_sentiment);
    for (category, count) in &categories {
        let _ = writeln!(out, "- {}: {}", category, count);
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "**TOP HEADLINES (last {}):**",
        sorted.len().min(max_headlines)
    );
    for article in sorted.iter().take(max_headlines) {
        let _ = writeln!(
            out,
            "- [{}] {} (sentiment {:+.2})",
            article.publisher, article.title, article.sentiment_score
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ingest_core::ArticleCategory;

    fn t(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 14, h, m, 0).unwrap()
    }

    fn bar(ts: DateTime<Utc>, close: f64) -> Bar {
        Bar {
            timestamp: ts,
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 1_000,
            fetched_at: t(23, 0),
        }
    }

    fn article(title: &str, sentiment: f64, published_at: DateTime<Utc>) -> Article {
        Article {
            content_hash: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            summary: String::new(),
            link: "https://example.com".to_string(),
            publisher: "Reuters".to_string(),
            symbol: "GC=F".to_string(),
            published_at,
            sentiment_score: sentiment,
            category: ArticleCategory::MarketMovement,
            keywords: vec![],
            fetched_at: t(23, 0),
        }
    }

    #[test]
    fn empty_inputs_render_placeholders() {
        let brief = render_market_brief("15m", &[], &[], &BriefOptions::default());
        assert!(brief.contains("No recent market data available."));
        assert!(!brief.contains("NEWS SENTIMENT"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| bar(t(9, 0) + Duration::minutes(15 * i), 2000.0 + i as f64))
            .collect();
        let articles = vec![
            article("Gold climbs", 0.4, t(8, 0)),
            article("Gold slips", -0.2, t(9, 0)),
        ];

        let options = BriefOptions::default();
        let a = render_market_brief("15m", &bars, &articles, &options);
        let b = render_market_brief("15m", &bars, &articles, &options);
        assert_eq!(a, b);

        // Input order must not matter
        let mut shuffled = bars.clone();
        shuffled.reverse();
        let c = render_market_brief("15m", &shuffled, &articles, &options);
        assert_eq!(a, c);
    }

    #[test]
    fn history_is_bounded_by_max_points() {
        let bars: Vec<Bar> = (0..50)
            .map(|i| bar(t(0, 0) + Duration::minutes(15 * i), 2000.0))
            .collect();

        let block = render_price_block("15m", &bars, 20);
        let history_lines = block
            .lines()
            .filter(|l| l.starts_with("- 2024-"))
            .count();
        assert_eq!(history_lines, 20);
    }

    #[test]
    fn trend_direction_follows_closes() {
        let rising: Vec<Bar> = (0..20)
            .map(|i| bar(t(0, 0) + Duration::minutes(15 * i), 2000.0 + i as f64 * 5.0))
            .collect();
        let block = render_price_block("15m", &rising, 20);
        assert!(block.contains("Short-term Trend: UPWARD"));

        let falling: Vec<Bar> = (0..20)
            .map(|i| bar(t(0, 0) + Duration::minutes(15 * i), 2000.0 - i as f64 * 5.0))
            .collect();
        let block = render_price_block("15m", &falling, 20);
        assert!(block.contains("Short-term Trend: DOWNWARD"));
    }

    #[test]
    fn news_block_averages_and_bounds_headlines() {
        let articles: Vec<Article> = (0..15)
            .map(|i| {
                article(
                    &format!("Headline {}", i),
                    0.2,
                    t(1, 0) + Duration::hours(i),
                )
            })
            .collect();

        let block = render_news_block(&articles, 10);
        assert!(block.contains("NEWS SENTIMENT (15 articles)"));
        assert!(block.contains("Average Sentiment: 0.200"));
        let headline_lines = block.lines().filter(|l| l.starts_with("- [")).count();
        assert_eq!(headline_lines, 10);
        // Newest headline leads
        assert!(block.contains("Headline 14"));
        assert!(!block.contains("Headline 0 "));
    }
}
