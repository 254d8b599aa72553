//! Trend rebuild: recount keyword occurrences per calendar day across all
//! stored articles and merge the totals into the trend table in one
//! transaction. The merge is additive: running the job twice over the
//! same article set doubles the derived counts. Callers are expected to
//! invoke it once per backfill, after a bulk import or to repair drift.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::TrendCounter;

pub async fn run_aggregation(repo: &Repository) -> Result<()> {
    tracing::info!("rebuilding keyword trends from stored articles");

    let rows = repo.article_keyword_rows().await?;
    if rows.is_empty() {
        tracing::info!("no stored articles to aggregate");
        return Ok(());
    }

    let counters = count_daily_keywords(rows);
    let entries = counters.len();

    repo.merge_trends(counters)
        .await
        .map_err(|e| AppError::Aggregation(e.to_string()))?;

    tracing::info!("aggregation complete, merged {} trend entries", entries);
    Ok(())
}

/// Group raw `(keywords_json, published_at)` rows by day, then count each
/// keyword within its day. Rows with unreadable fields are dropped with a
/// warning rather than failing the job.
fn count_daily_keywords(rows: Vec<(String, String)>) -> Vec<TrendCounter> {
    let mut daily: BTreeMap<NaiveDate, BTreeMap<String, i64>> = BTreeMap::new();

    for (keywords_json, published_at) in rows {
        let keywords: Vec<String> = match serde_json::from_str(&keywords_json) {
            Ok(keywords) => keywords,
            Err(err) => {
                tracing::warn!("skipping article with unreadable keywords: {}", err);
                continue;
            }
        };
        if keywords.is_empty() {
            continue;
        }

        let date = match DateTime::parse_from_rfc3339(&published_at) {
            Ok(dt) => dt.with_timezone(&Utc).date_naive(),
            Err(err) => {
                tracing::warn!(
                    "skipping article with unreadable published_at {:?}: {}",
                    published_at,
                    err
                );
                continue;
            }
        };

        let day = daily.entry(date).or_default();
        for keyword in keywords {
            *day.entry(keyword).or_insert(0) += 1;
        }
    }

    daily
        .into_iter()
        .flat_map(|(date, keywords)| {
            keywords
                .into_iter()
                .map(move |(keyword, frequency)| TrendCounter {
                    keyword,
                    date,
                    frequency,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewArticle;
    use chrono::TimeZone;

    fn stored_article(url: &str, keywords: &[&str], day: u32) -> NewArticle {
        NewArticle {
            title: "Imported headline".to_string(),
            source: "Bulk Import".to_string(),
            content: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 1, day, 6, 0, 0).unwrap(),
            url: url.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    async fn open_temp() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::open(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    #[test]
    fn groups_by_day_then_keyword() {
        let rows = vec![
            (
                r#"["ai","chips"]"#.to_string(),
                "2024-01-01T08:00:00+00:00".to_string(),
            ),
            (
                r#"["ai"]"#.to_string(),
                "2024-01-01T21:00:00+00:00".to_string(),
            ),
            (
                r#"["ai"]"#.to_string(),
                "2024-01-02T03:00:00+00:00".to_string(),
            ),
        ];

        let counters = count_daily_keywords(rows);
        assert_eq!(
            counters,
            vec![
                TrendCounter {
                    keyword: "ai".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    frequency: 2,
                },
                TrendCounter {
                    keyword: "chips".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    frequency: 1,
                },
                TrendCounter {
                    keyword: "ai".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    frequency: 1,
                },
            ]
        );
    }

    #[test]
    fn unreadable_rows_are_dropped() {
        let rows = vec![
            ("not json".to_string(), "2024-01-01T08:00:00+00:00".to_string()),
            (r#"["ai"]"#.to_string(), "yesterday".to_string()),
            (r#"[]"#.to_string(), "2024-01-01T08:00:00+00:00".to_string()),
        ];
        assert!(count_daily_keywords(rows).is_empty());
    }

    #[tokio::test]
    async fn backfills_trends_from_imported_articles() {
        let (_dir, repo) = open_temp().await;

        repo.insert_article_raw(stored_article("http://example.com/a", &["ai"], 1))
            .await
            .unwrap();
        repo.insert_article_raw(stored_article("http://example.com/b", &["ai", "chips"], 1))
            .await
            .unwrap();

        run_aggregation(&repo).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(repo.trend_frequency("ai", day).await.unwrap(), Some(2));
        assert_eq!(repo.trend_frequency("chips", day).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn repeated_runs_double_counts() {
        let (_dir, repo) = open_temp().await;

        repo.insert_article_raw(stored_article("http://example.com/a", &["ai"], 1))
            .await
            .unwrap();

        run_aggregation(&repo).await.unwrap();
        run_aggregation(&repo).await.unwrap();

        // The second run adds on top of the first instead of recomputing
        // an absolute count.
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(repo.trend_frequency("ai", day).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn empty_store_is_success() {
        let (_dir, repo) = open_temp().await;
        run_aggregation(&repo).await.unwrap();
        assert_eq!(repo.count_trend_rows().await.unwrap(), 0);
    }
}
