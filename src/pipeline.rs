//! Ingestion run: fetch a headline batch, then per article skip, enrich,
//! and persist. A fetch failure fails the whole run; a single article's
//! persistence failure is logged and the batch carries on.

use chrono::Utc;

use crate::db::Repository;
use crate::error::Result;
use crate::feed::FeedClient;
use crate::models::{FeedArticle, NewArticle};
use crate::nlp;

#[derive(Debug, Default, Clone, Copy)]
pub struct IngestStats {
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub async fn run_ingestion(client: &FeedClient, repo: &Repository) -> Result<IngestStats> {
    tracing::info!("fetching latest headlines");
    let batch = client.fetch_headlines().await?;

    if batch.is_empty() {
        tracing::info!("feed returned no articles");
        return Ok(IngestStats::default());
    }

    tracing::info!("fetched {} articles, processing", batch.len());
    let stats = process_batch(repo, batch).await;
    tracing::info!(
        "ingestion run complete: {} fetched, {} inserted, {} duplicates, {} skipped, {} failed",
        stats.fetched,
        stats.inserted,
        stats.duplicates,
        stats.skipped,
        stats.failed
    );
    Ok(stats)
}

/// Process one fetched batch in feed order. Never fails as a whole:
/// per-article errors are counted and logged.
pub async fn process_batch(repo: &Repository, batch: Vec<FeedArticle>) -> IngestStats {
    let mut stats = IngestStats {
        fetched: batch.len(),
        ..IngestStats::default()
    };

    for article in batch {
        let (title, url) = match (&article.title, &article.url) {
            (Some(title), Some(url)) if !title.is_empty() && !url.is_empty() => {
                (title.clone(), url.clone())
            }
            _ => {
                stats.skipped += 1;
                continue;
            }
        };

        let content = article.content.clone().unwrap_or_default();
        let keywords = nlp::extract_keywords(&format!("{} {}", title, content));

        // Sentiment falls back to the title when the body is absent.
        let sentiment_input = if content.is_empty() { &title } else { &content };
        let (label, score) = nlp::analyze_sentiment(sentiment_input);

        let new_article = NewArticle {
            title,
            source: article
                .source
                .and_then(|s| s.name)
                .unwrap_or_default(),
            content,
            published_at: article.published_at.unwrap_or_else(Utc::now),
            url: url.clone(),
            keywords,
        };

        match repo.insert_article_bundle(new_article, label, score).await {
            Ok(Some(_)) => stats.inserted += 1,
            Ok(None) => stats.duplicates += 1,
            Err(err) => {
                tracing::warn!("failed to store article {}: {}", url, err);
                stats.failed += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedArticle, FeedSource};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn feed_article(title: Option<&str>, url: Option<&str>, content: &str) -> FeedArticle {
        FeedArticle {
            title: title.map(str::to_string),
            source: Some(FeedSource {
                name: Some("Test Wire".to_string()),
            }),
            content: Some(content.to_string()),
            published_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
            url: url.map(str::to_string),
        }
    }

    async fn open_temp() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::open(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn malformed_articles_are_skipped_not_fatal() {
        let (_dir, repo) = open_temp().await;

        let batch = vec![
            feed_article(None, Some("http://x"), ""),
            feed_article(Some("A"), Some("http://y"), ""),
        ];
        let stats = process_batch(&repo, batch).await;

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.inserted, 1);
        assert_eq!(repo.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reprocessing_the_same_batch_is_idempotent() {
        let (_dir, repo) = open_temp().await;

        let batch = vec![
            feed_article(
                Some("Markets rally on strong earnings"),
                Some("http://example.com/rally"),
                "Stocks posted record gains across every major index today",
            ),
            feed_article(
                Some("Storm damages coastal towns"),
                Some("http://example.com/storm"),
                "Heavy winds caused widespread damage along the coast",
            ),
        ];

        let first = process_batch(&repo, batch.clone()).await;
        assert_eq!(first.inserted, 2);

        let second = process_batch(&repo, batch).await;
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);

        assert_eq!(repo.count_articles().await.unwrap(), 2);
        assert_eq!(repo.count_sentiments().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn keyword_counters_track_shared_keywords_per_day() {
        let (_dir, repo) = open_temp().await;

        let batch = vec![
            feed_article(
                Some("Election results spark nationwide debate"),
                Some("http://example.com/e1"),
                "",
            ),
            feed_article(
                Some("Election officials certify final tallies"),
                Some("http://example.com/e2"),
                "",
            ),
        ];
        process_batch(&repo, batch).await;

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            repo.trend_frequency("election", day).await.unwrap(),
            Some(2)
        );
    }

    #[tokio::test]
    async fn empty_batch_is_success() {
        let (_dir, repo) = open_temp().await;
        let stats = process_batch(&repo, Vec::new()).await;
        assert_eq!(stats.fetched, 0);
        assert_eq!(stats.inserted, 0);
    }
}
