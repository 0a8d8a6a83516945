//! HTTP client for the anime catalog API
//!
//! This module provides the shared JSON:API client. It bounds the number of
//! requests in flight, optionally spaces requests out, retries transient
//! failures with exponential backoff, and races every request against a
//! cancellation token.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{AnimeError, Result};

/// Base URL of the public Kitsu API
pub const DEFAULT_BASE_URL: &str = "https://kitsu.io/api/edge";

/// JSON:API media type, used for both Accept and Content-Type
const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

const DEFAULT_USER_AGENT: &str = concat!("anicat/", env!("CARGO_PKG_VERSION"));

/// Rate limiter to control request frequency
///
/// Ensures that requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    /// Minimum interval between requests
    min_interval: Duration,
    /// Timestamp of the last request
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// # Example
    /// ```
    /// use anicat_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0); // 2 requests per second
    /// ```
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = Duration::from_secs_f64(1.0 / requests_per_second);
        let now = Instant::now();
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(now.checked_sub(min_interval).unwrap_or(now))),
        }
    }

    /// Wait until the minimum interval since the previous request has passed
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }

        *last = Instant::now();
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Configuration for the catalog HTTP client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API root, without trailing slash (default: Kitsu edge API)
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Requests allowed in flight at once across all callers (default: 8)
    pub max_concurrent_requests: usize,
    /// Anime hydrated at once within one batch (default: 4)
    pub max_concurrent_hydrations: usize,
    /// Retries for 429 and 5xx responses (default: 2)
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry (default: 500ms)
    pub retry_base_delay_ms: u64,
    /// Optional cap on request rate (default: unlimited)
    pub requests_per_second: Option<f64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_concurrent_requests: 8,
            max_concurrent_hydrations: 4,
            max_retries: 2,
            retry_base_delay_ms: 500,
            requests_per_second: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at a different API root
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with `ANICAT_API_URL`, `ANICAT_TIMEOUT_SECS` and
    /// `ANICAT_MAX_CONCURRENCY` from the process environment
    ///
    /// # Errors
    /// `AnimeError::InvalidArgument` if a variable is set but unusable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ANICAT_API_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(secs) = parse_var(&lookup, "ANICAT_TIMEOUT_SECS")? {
            config.timeout_secs = secs;
        }
        if let Some(limit) = parse_var(&lookup, "ANICAT_MAX_CONCURRENCY")? {
            config.max_concurrent_requests = limit;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AnimeError::InvalidArgument(format!(
                "Base URL must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.max_concurrent_requests == 0 || self.max_concurrent_hydrations == 0 {
            return Err(AnimeError::InvalidArgument(
                "Concurrency limits must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(AnimeError::InvalidArgument(
                "Timeout must be at least 1 second".to_string(),
            ));
        }
        if let Some(rate) = self.requests_per_second {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(AnimeError::InvalidArgument(format!(
                    "Request rate must be positive, got {}",
                    rate
                )));
            }
            if Duration::try_from_secs_f64(1.0 / rate).is_err() {
                return Err(AnimeError::InvalidArgument(format!(
                    "Request rate {} is too low to schedule",
                    rate
                )));
            }
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            AnimeError::InvalidArgument(format!("{} must be a number, got {:?}", key, raw))
        }),
        None => Ok(None),
    }
}

/// HTTP client for the catalog API
///
/// This client automatically:
/// - Bounds requests in flight with a semaphore shared by all callers
/// - Retries on transient errors (429, 5xx) with exponential backoff
/// - Aborts any request or backoff as soon as the caller's token is cancelled
///
/// It holds no per-call state and is meant to be shared behind an `Arc`.
pub struct AnimeClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Permits for requests in flight
    permits: Arc<Semaphore>,
    /// Optional request throttling
    rate_limiter: Option<RateLimiter>,
    config: ClientConfig,
}

impl AnimeClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created
    pub fn with_config(mut config: ClientConfig) -> Result<Self> {
        config.validate()?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API_MEDIA_TYPE));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            rate_limiter: config.requests_per_second.map(RateLimiter::new),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an API path such as `/anime/1/genres`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// GET a JSON document from an API path and decode it
    ///
    /// # Errors
    /// - `AnimeError::Cancelled` - `cancel` fired before the response arrived
    /// - `AnimeError::NotFound` - Server returned 404
    /// - `AnimeError::RateLimited` - Server returned 429 after all retries
    /// - `AnimeError::Status` - Other non-success status (after retries for 5xx)
    /// - `AnimeError::Timeout` - No response within the configured timeout
    /// - `AnimeError::InvalidResponse` - Body is not the expected JSON
    pub async fn get_json<T>(
        &self,
        path: &str,
        query: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AnimeError::Cancelled),
                outcome = self.send_once::<T>(&url, query) => outcome,
            };

            match outcome {
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.calculate_backoff_delay(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying request"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AnimeError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    /// One request/response exchange, holding a permit for its duration
    async fn send_once<T>(&self, url: &str, query: &[(String, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AnimeError::Cancelled)?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        debug!(url, params = query.len(), "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(e, url))?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await.map_err(|e| transport_error(e, url))?;
            return serde_json::from_slice(&body)
                .map_err(|e| AnimeError::InvalidResponse(format!("{}: {}", url, e)));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AnimeError::NotFound(url.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AnimeError::RateLimited);
        }

        Err(AnimeError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }

    /// Calculate exponential backoff delay for retry
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.config.retry_base_delay_ms.saturating_mul(factor))
    }

    /// Permits currently free (for testing)
    #[cfg(test)]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

fn transport_error(err: reqwest::Error, url: &str) -> AnimeError {
    if err.is_timeout() {
        AnimeError::Timeout(url.to_string())
    } else {
        AnimeError::HttpError(err)
    }
}
