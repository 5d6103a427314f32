//! Rate-limited HTTP fetching
//!
//! Requests go out strictly one at a time. A [`RateLimiter`] keeps the start
//! of consecutive requests at least one interval apart, and
//! [`RateLimitedFetcher`] retries transient failures with exponential
//! backoff. Time and the network are both behind traits so the pipeline can
//! be exercised without real delays or a live API.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::nyt::query::redact;
use crate::nyt::CollectError;

/// Status and body of one HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP GET
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, CollectError>;
}

/// Source of time for the limiter and the retry backoff
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio's timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// reqwest-backed transport with a request timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self, CollectError> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            client,
            timeout: config.http_timeout(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, CollectError> {
        let result = async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse { status, body })
        }
        .await;

        result.map_err(|e| {
            if e.is_timeout() {
                CollectError::Timeout(self.timeout)
            } else {
                CollectError::Http(e)
            }
        })
    }
}

/// Fixed-interval limiter: two requests never start less than
/// `interval` apart. The first acquisition does not wait.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    interval: Duration,
    last_start: Option<Instant>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            last_start: None,
        }
    }

    /// Wait until a request may start, then record its start time
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_start {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                debug!("Rate limiting: waiting {:?} before next request", wait);
                self.clock.sleep(wait).await;
            }
        }
        self.last_start = Some(self.clock.now());
    }
}

/// Bounded exponential backoff for retryable errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based):
    /// `min(base_delay * 2^(attempt-1), max_delay)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Issues GETs through the rate limiter, retrying transient failures
pub struct RateLimitedFetcher {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl RateLimitedFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        retry: RetryPolicy,
    ) -> Self {
        let limiter = RateLimiter::new(Arc::clone(&clock), interval);
        Self {
            transport,
            clock,
            limiter,
            retry,
        }
    }

    /// Production fetcher: reqwest transport, tokio clock, limits from config
    pub fn from_config(config: &Config) -> Result<Self, CollectError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(TokioClock),
            config.request_interval(),
            config.retry_policy(),
        ))
    }

    /// GET `url` and return the response body. Non-2xx statuses become
    /// [`CollectError::ApiError`].
    pub async fn fetch(&mut self, url: &Url) -> Result<String, CollectError> {
        let mut attempt = 0u32;

        loop {
            self.limiter.acquire().await;
            debug!("GET {}", redact(url));

            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        self.retry.max_retries + 1,
                        delay,
                        e
                    );
                    self.clock.sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> Result<String, CollectError> {
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(CollectError::ApiError {
                status_code: response.status,
                message: response.body,
            });
        }
        Ok(response.body)
    }
}
