//! HTTP retrieval with exponential backoff retry logic.
//!
//! All adapters share one [`HttpFetcher`], which wraps a `reqwest` client
//! that has a per-request timeout. Transient failures (connect errors,
//! timeouts, 5xx, 429) are retried with exponential backoff and jitter;
//! anything else fails immediately so a broken source does not slow down
//! the poll cycle.
//!
//! # Retry Strategy
//!
//! - Maximum 2 retry attempts by default
//! - Exponential backoff starting at 500 ms
//! - Maximum delay capped at 5 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::scrapers::SourceError;
use rand::{Rng, rng};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

/// A fetched document and the URL it was finally served from.
#[derive(Debug)]
pub struct Page {
    /// Final URL after redirects; relative links resolve against it.
    pub url: Url,
    pub body: String,
}

/// Shared HTTP client with retry.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl HttpFetcher {
    /// Create a fetcher whose individual requests give up after `request_timeout`.
    pub fn new(request_timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        })
    }

    /// Override the retry budget.
    pub fn with_retries(mut self, max_retries: usize, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// GET `url` as text, retrying transient failures.
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Result<Page, SourceError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.get_once(url).await {
                Ok(page) => {
                    debug!(
                        bytes = page.body.len(),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Fetched page"
                    );
                    return Ok(page);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !e.is_retryable() {
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = backoff_delay(self.base_delay, self.max_delay, attempt)
                        + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        ?delay,
                        error = %e,
                        "GET failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<Page, SourceError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }
        let final_url = resp.url().clone();
        let body = resp.text().await?;
        Ok(Page {
            url: final_url,
            body,
        })
    }
}

/// `min(base * 2^(attempt-1), max)` for a 1-based attempt number.
fn backoff_delay(base: Duration, max: Duration, attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    base.saturating_mul(1 << shift).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        let base = Duration::from_millis(500);
        let max = Duration::from_secs(5);
        assert_eq!(backoff_delay(base, max, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, max, 2), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, max, 3), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, max, 5), Duration::from_secs(5));
        assert_eq!(backoff_delay(base, max, 60), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_get_fails_fast_on_unreachable_host() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2))
            .unwrap()
            .with_retries(0, Duration::from_millis(1));
        let res = fetcher.get("http://127.0.0.1:9/unreachable").await;
        assert!(matches!(res, Err(SourceError::Http(_))));
    }
}
