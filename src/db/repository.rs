use rusqlite::params;
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{NewArticle, SentimentLabel, TrendCounter};

use super::schema::SCHEMA;

/// Owns the SQLite connection; the ingestion pipeline and the aggregation
/// job borrow it and hold no durable state of their own.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    /// Insert an article with its sentiment record and per-keyword trend
    /// bumps as one transaction. Returns `None` when the URL is already
    /// stored, in which case nothing at all is written.
    pub async fn insert_article_bundle(
        &self,
        article: NewArticle,
        label: SentimentLabel,
        score: f64,
    ) -> Result<Option<i64>> {
        let keywords_json = serde_json::to_string(&article.keywords)?;

        let id = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let inserted = tx.execute(
                    r#"INSERT INTO articles (title, source, content, published_at, url, keywords)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                       ON CONFLICT(url) DO NOTHING"#,
                    params![
                        article.title,
                        article.source,
                        article.content,
                        article.published_at.to_rfc3339(),
                        article.url,
                        keywords_json,
                    ],
                )?;
                if inserted == 0 {
                    // Duplicate URL: skip sentiment and trend writes entirely.
                    return Ok(None);
                }

                let id = tx.last_insert_rowid();
                tx.execute(
                    "INSERT INTO sentiments (news_id, sentiment, score) VALUES (?1, ?2, ?3)",
                    params![id, label.as_str(), score],
                )?;

                let day = article.published_at.date_naive().to_string();
                for keyword in &article.keywords {
                    tx.execute(
                        r#"INSERT INTO trends (keyword, date, frequency)
                           VALUES (?1, ?2, 1)
                           ON CONFLICT(keyword, date)
                           DO UPDATE SET frequency = frequency + 1"#,
                        params![keyword, day],
                    )?;
                }

                tx.commit()?;
                Ok(Some(id))
            })
            .await?;
        Ok(id)
    }

    /// Raw `(keywords_json, published_at)` pairs for every stored article.
    /// The aggregation job parses and groups them in memory.
    pub async fn article_keyword_rows(&self) -> Result<Vec<(String, String)>> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT keywords, published_at FROM articles")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }

    /// Merge precomputed counters into the trend table additively, all or
    /// nothing. A failure on any row rolls the whole batch back.
    pub async fn merge_trends(&self, counters: Vec<TrendCounter>) -> Result<()> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for counter in &counters {
                    tx.execute(
                        r#"INSERT INTO trends (keyword, date, frequency)
                           VALUES (?1, ?2, ?3)
                           ON CONFLICT(keyword, date)
                           DO UPDATE SET frequency = frequency + excluded.frequency"#,
                        params![counter.keyword, counter.date.to_string(), counter.frequency],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    #[cfg(test)]
    pub async fn count_articles(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM articles").await
    }

    #[cfg(test)]
    pub async fn count_sentiments(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM sentiments").await
    }

    #[cfg(test)]
    pub async fn count_trend_rows(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM trends").await
    }

    #[cfg(test)]
    async fn count(&self, sql: &'static str) -> Result<i64> {
        let n = self
            .conn
            .call(move |conn| {
                let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
                Ok(n)
            })
            .await?;
        Ok(n)
    }

    #[cfg(test)]
    pub async fn trend_frequency(
        &self,
        keyword: &str,
        date: chrono::NaiveDate,
    ) -> Result<Option<i64>> {
        use rusqlite::OptionalExtension;

        let keyword = keyword.to_string();
        let date = date.to_string();
        let frequency = self
            .conn
            .call(move |conn| {
                let frequency = conn
                    .query_row(
                        "SELECT frequency FROM trends WHERE keyword = ?1 AND date = ?2",
                        params![keyword, date],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(frequency)
            })
            .await?;
        Ok(frequency)
    }

    /// Bare article insert without sentiment or trend writes. Mirrors a
    /// bulk import, which is the state the aggregation job backfills from.
    #[cfg(test)]
    pub async fn insert_article_raw(&self, article: NewArticle) -> Result<()> {
        let keywords_json = serde_json::to_string(&article.keywords)?;
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO articles (title, source, content, published_at, url, keywords)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
                    params![
                        article.title,
                        article.source,
                        article.content,
                        article.published_at.to_rfc3339(),
                        article.url,
                        keywords_json,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
