use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// Article ready for insertion, after enrichment. Stored rows additionally
/// carry a server-generated id; nothing in the pipeline reads them back.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub source: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

/// Daily frequency counter for one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendCounter {
    pub keyword: String,
    pub date: NaiveDate,
    pub frequency: i64,
}

// Wire types for the upstream headlines endpoint. Everything is optional:
// the feed routinely returns entries with null fields and the pipeline
// decides what to skip.

#[derive(Debug, Deserialize)]
pub struct HeadlinesResponse {
    #[serde(default)]
    pub articles: Vec<FeedArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<FeedSource>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedSource {
    #[serde(default)]
    pub name: Option<String>,
}
