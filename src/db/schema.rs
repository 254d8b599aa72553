pub const SCHEMA: &str = r#"
-- articles table: one row per distinct canonical URL
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    published_at TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    keywords TEXT NOT NULL DEFAULT '[]',
    fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at DESC);

-- sentiments table: one record per stored article
CREATE TABLE IF NOT EXISTS sentiments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    news_id INTEGER NOT NULL UNIQUE REFERENCES articles(id) ON DELETE CASCADE,
    sentiment TEXT NOT NULL,
    score REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sentiments_news_id ON sentiments(news_id);

-- trends table: additive per-day keyword counters
CREATE TABLE IF NOT EXISTS trends (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    keyword TEXT NOT NULL,
    date TEXT NOT NULL,
    frequency INTEGER NOT NULL DEFAULT 0,
    UNIQUE(keyword, date)
);

CREATE INDEX IF NOT EXISTS idx_trends_date ON trends(date);
"#;
