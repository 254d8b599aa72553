use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{FeedArticle, HeadlinesResponse};

const HEADLINES_URL: &str = "https://newsapi.org/v2/top-headlines";

/// Upstream feed client: fixed timeout, optional egress proxy, bounded
/// exponential-backoff retry on transient network errors only.
pub struct FeedClient {
    client: Client,
    api_key: String,
    country: String,
    retries: u32,
    backoff: Duration,
}

impl FeedClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("newswatch/0.1");

        if config.use_proxy {
            let proxy_url = format!("http://{}:{}", config.proxy_host, config.proxy_port);
            let proxy = reqwest::Proxy::all(&proxy_url)
                .map_err(|e| AppError::Config(format!("bad proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        if config.skip_tls_verify {
            tracing::warn!("TLS certificate verification is disabled for feed requests");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            country: config.country.clone(),
            retries: config.retry_count,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Fetch the latest headline batch, retrying transient failures.
    pub async fn fetch_headlines(&self) -> Result<Vec<FeedArticle>> {
        retry_request(|| self.attempt(), self.retries, self.backoff).await
    }

    async fn attempt(&self) -> Result<Vec<FeedArticle>> {
        let response = self
            .client
            .get(HEADLINES_URL)
            .query(&[
                ("country", self.country.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: HeadlinesResponse =
            response.json().await.map_err(|e| AppError::Upstream {
                status: status.as_u16(),
                body: format!("malformed feed body: {}", e),
            })?;
        Ok(parsed.articles)
    }
}

/// Run `attempt` up to `retries` times, doubling the delay after each
/// transient network failure. Upstream errors and non-transient network
/// errors propagate immediately; exhaustion surfaces the last error.
async fn retry_request<T, F, Fut>(mut attempt: F, retries: u32, initial_backoff: Duration) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = retries.max(1);
    let mut backoff = initial_backoff;

    for i in 1..=attempts {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AppError::Network { kind, message }) if kind.is_transient() && i < attempts => {
                tracing::warn!(
                    "network error ({}) on attempt {}/{}: {}; retrying in {:?}",
                    kind,
                    i,
                    attempts,
                    message,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(err) => return Err(err),
        }
    }
    unreachable!("final attempt either returned or propagated its error")
}
