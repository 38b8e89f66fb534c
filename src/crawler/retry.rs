//! Bounded retry with jittered backoff around a [`PageFetcher`]
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 429 | Sleep random delay, retry |
//! | HTTP 5xx | Sleep random delay, retry |
//! | Transport error | Sleep random delay, retry |
//! | Any other status | Return the page |
//!
//! After `max_attempts` failed attempts the fetch fails for good. No sleep
//! follows the final attempt.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchedPage, PageFetcher};
use crate::LumiError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Attempt count and delay bounds for retried fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            min_delay: config.min_delay(),
            max_delay: config.max_delay(),
        }
    }
}

/// Picks a delay uniformly from `[min, max)`
///
/// Returns `min` when the range is empty.
pub fn jittered_delay<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let span = (max - min).as_millis() as u64;
    if span == 0 {
        return min;
    }
    min + Duration::from_millis(rng.gen_range(0..span))
}

/// Fetches pages with bounded retry
///
/// Each call is independent; the only shared piece is the random generator
/// used for backoff, so one instance serves every worker of a crawl.
pub struct RateLimitedFetcher {
    inner: Arc<dyn PageFetcher>,
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl RateLimitedFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>, policy: RetryPolicy) -> Self {
        Self::with_rng(inner, policy, StdRng::from_entropy())
    }

    /// Uses the given generator for backoff delays
    pub fn with_rng(inner: Arc<dyn PageFetcher>, policy: RetryPolicy, rng: StdRng) -> Self {
        Self {
            inner,
            policy,
            rng: Mutex::new(rng),
        }
    }

    fn next_delay(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        jittered_delay(&mut *rng, self.policy.min_delay, self.policy.max_delay)
    }

    /// Fetches `url`, retrying rate limits and transient failures
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, LumiError> {
        let attempts = self.policy.max_attempts;

        for attempt in 1..=attempts {
            match self.inner.fetch(url).await {
                Ok(page) if page.is_rate_limited() => {
                    tracing::warn!(
                        "Rate limit exceeded for {} (attempt {}/{})",
                        url,
                        attempt,
                        attempts
                    );
                }
                Ok(page) if page.is_server_error() => {
                    tracing::warn!(
                        "HTTP {} from {} (attempt {}/{})",
                        page.status,
                        url,
                        attempt,
                        attempts
                    );
                }
                Ok(page) => return Ok(page),
                Err(e) => {
                    tracing::warn!(
                        "Error fetching {}: {} (attempt {}/{})",
                        url,
                        e,
                        attempt,
                        attempts
                    );
                }
            }

            if attempt < attempts {
                let delay = self.next_delay();
                tracing::debug!("Retrying {} in {:?}", url, delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(LumiError::RetriesExhausted {
            url: url.to_string(),
            attempts,
        })
    }
}
