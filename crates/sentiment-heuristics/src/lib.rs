//! Keyword-based sentiment, categorization and keyword extraction for
//! gold-market news. Pure functions of the input text; the ingestion core
//! only sees these through the `SentimentModel` trait.

use ingest_core::{ArticleCategory, SentimentModel};

const POSITIVE_WORDS: &[&str] = &[
    "surge", "rally", "rise", "gain", "up", "bullish", "strong", "high",
    "increase", "boost", "positive", "optimistic", "buy", "support",
];

const NEGATIVE_WORDS: &[&str] = &[
    "fall", "drop", "decline", "down", "bearish", "weak", "low",
    "decrease", "crash", "negative", "pessimistic", "sell", "pressure",
];

const GOLD_KEYWORDS: &[&str] = &[
    "gold", "precious metals", "bullion", "mining", "fed", "inflation",
    "dollar", "economy", "market", "price", "trading", "investment",
    "central bank", "interest rates", "commodity", "futures",
];

/// Default `SentimentModel` implementation backed by fixed keyword lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordHeuristics;

impl KeywordHeuristics {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentModel for KeywordHeuristics {
    fn score(&self, text: &str) -> f64 {
        let text = text.to_lowercase();

        let positive = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
        let negative = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;

        let total_words = text.split_whitespace().count() as f64;
        if total_words == 0.0 {
            return 0.0;
        }

        let score = (positive - negative) / (total_words * 0.1).max(1.0);
        score.clamp(-1.0, 1.0)
    }

    fn categorize(&self, text: &str) -> ArticleCategory {
        let text = text.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if contains_any(&["fed", "federal reserve", "interest rate", "monetary policy"]) {
            ArticleCategory::MonetaryPolicy
        } else if contains_any(&["mining", "production", "supply"]) {
            ArticleCategory::SupplyDemand
        } else if contains_any(&["trading", "price", "market", "rally", "drop"]) {
            ArticleCategory::MarketMovement
        } else if contains_any(&["geopolitical", "war", "crisis", "tension"]) {
            ArticleCategory::Geopolitical
        } else if contains_any(&["economic", "gdp", "employment", "inflation"]) {
            ArticleCategory::EconomicData
        } else {
            ArticleCategory::General
        }
    }

    fn keywords(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        GOLD_KEYWORDS
            .iter()
            .filter(|kw| text.contains(*kw))
            .map(|kw| kw.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_text_scores_positive() {
        let model = KeywordHeuristics::new();
        let score = model.score("Gold prices surge in strong rally as buyers boost demand");
        assert!(score > 0.0, "expected positive score, got {}", score);
    }

    #[test]
    fn negative_text_scores_negative() {
        let model = KeywordHeuristics::new();
        let score = model.score("Gold falls in sharp drop amid bearish pressure and weak demand");
        assert!(score < 0.0, "expected negative score, got {}", score);
    }

    #[test]
    fn empty_text_is_neutral() {
        let model = KeywordHeuristics::new();
        assert_eq!(model.score(""), 0.0);
    }

    #[test]
    fn score_is_clamped() {
        let model = KeywordHeuristics::new();
        let score = model.score("surge rally rise gain bullish strong");
        assert!(score <= 1.0);
    }

    #[test]
    fn categorize_picks_first_matching_bucket() {
        let model = KeywordHeuristics::new();
        assert_eq!(
            model.categorize("Federal Reserve holds interest rates steady"),
            ArticleCategory::MonetaryPolicy
        );
        assert_eq!(
            model.categorize("Mine production disruptions tighten supply"),
            ArticleCategory::SupplyDemand
        );
        assert_eq!(
            model.categorize("Bullion price rally extends into third week"),
            ArticleCategory::MarketMovement
        );
        assert_eq!(
            model.categorize("Quiet session ahead of the long weekend"),
            ArticleCategory::General
        );
    }

    #[test]
    fn keywords_are_extracted_from_text() {
        let model = KeywordHeuristics::new();
        let keywords = model.keywords("Gold futures climb as central bank buying continues");
        assert!(keywords.contains(&"gold".to_string()));
        assert!(keywords.contains(&"central bank".to_string()));
        assert!(keywords.contains(&"futures".to_string()));
        assert!(!keywords.contains(&"inflation".to_string()));
    }
}
