//! Pure text enrichment: keyword extraction and lexicon sentiment.
//! No I/O, no state; everything here is deterministic.

mod lexicon;

use crate::models::SentimentLabel;

const MAX_KEYWORDS: usize = 5;
const MIN_KEYWORD_LEN: usize = 4;

/// Lowercase `text`, split on non-alphanumeric boundaries, drop short
/// tokens, and keep the first five survivors in order of appearance.
pub fn extract_keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_KEYWORD_LEN)
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Sum per-token lexicon weights over `text`. The sign of the total
/// decides the label; zero (including empty input) is Neutral.
pub fn analyze_sentiment(text: &str) -> (SentimentLabel, f64) {
    let score: i64 = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| i64::from(lexicon::weight(token)))
        .sum();

    let label = match score.cmp(&0) {
        std::cmp::Ordering::Greater => SentimentLabel::Positive,
        std::cmp::Ordering::Less => SentimentLabel::Negative,
        std::cmp::Ordering::Equal => SentimentLabel::Neutral,
    };
    (label, score as f64)
}
