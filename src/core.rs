use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use reqwest::header::{HeaderMap, HeaderValue};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::config::EdinetConfig;
use super::error::{EdinetError, Result};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

#[derive(Debug, Clone)]
pub struct Edinet {
    /// HTTP client for making requests
    pub(crate) client: reqwest::Client,

    /// Token bucket rate limiter shared by every clone of the client
    pub(crate) rate_limiter: Arc<Governor>,

    /// Whether a subscription key was configured
    pub(crate) has_credential: bool,

    /// Base URL of the EDINET API
    pub(crate) base_url: String,

    pub(crate) max_retries: u32,
    pub(crate) initial_backoff: Duration,
    pub(crate) rate_limit_cooldown: Duration,

    /// Number of listing dates requested at once
    pub(crate) concurrency: usize,

    /// Default directory for downloaded documents
    pub(crate) download_dir: PathBuf,
}

/// HTTP client for the EDINET v2 API with built-in rate limiting and retry logic.
///
/// `Edinet` is the entry point for everything that touches the network: the daily
/// document listing used by filing discovery and the document download endpoint that
/// returns XBRL bundles and PDFs. Every request waits on a shared token bucket, and
/// transient failures are retried with exponential backoff.
///
/// # Rate Limiting
///
/// EDINET does not publish a hard quota, but it answers bursts with HTTP 429. The client
/// throttles itself with a token bucket (3 requests per second by default) and, when a
/// 429 still arrives, waits for the exponential backoff *plus* a fixed cooldown before
/// trying again:
///
/// ```text
/// attempt 1 ── 429 ──> wait 2s  + 60s
/// attempt 2 ── 429 ──> wait 4s  + 60s
/// attempt 3 ── 429 ──> wait 8s  + 60s
/// attempt 4 ── 429 ──> RateLimitExceeded
/// ```
///
/// Timeouts and connection failures use the backoff without the cooldown.
///
/// # Credentials
///
/// A client built without a subscription key is still valid. Remote calls on it return
/// [`EdinetError::MissingCredential`], which the discovery layer reports as "no filing"
/// instead of failing the surrounding analysis.
///
/// # Examples
///
/// ```rust
/// # use edinetkit::Edinet;
/// let edinet = Edinet::new("my-subscription-key")?;
/// # Ok::<(), edinetkit::EdinetError>(())
/// ```
///
/// With custom configuration:
///
/// ```rust
/// # use edinetkit::{Edinet, EdinetConfig};
/// # use std::time::Duration;
/// let config = EdinetConfig::new("my-subscription-key")
///     .with_rate_limit(1)
///     .with_timeout(Duration::from_secs(120));
/// let edinet = Edinet::with_config(config)?;
/// # Ok::<(), edinetkit::EdinetError>(())
/// ```
impl Edinet {
    /// Creates a client with default tuning and the given subscription key.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_config(EdinetConfig::new(api_key))
    }

    /// Creates a client from `EDINET_*` environment variables (see [`EdinetConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Self::with_config(EdinetConfig::from_env())
    }

    /// Creates an Edinet client with custom configuration settings.
    ///
    /// # Errors
    ///
    /// Returns `EdinetError::ConfigError` if the key is not a valid header value, the
    /// rate limit is zero, or the HTTP client cannot be built.
    pub fn with_config(config: EdinetConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            headers.insert(
                SUBSCRIPTION_KEY_HEADER,
                HeaderValue::from_str(key)
                    .map_err(|e| EdinetError::ConfigError(format!("Invalid API key: {}", e)))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| EdinetError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(config.rate_limit).ok_or_else(|| {
                EdinetError::ConfigError("Rate limit must be greater than zero".to_string())
            })?,
        )));

        Ok(Edinet {
            client,
            rate_limiter,
            has_credential: config.api_key.is_some(),
            base_url: config.base_url,
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
            rate_limit_cooldown: config.rate_limit_cooldown,
            concurrency: config.concurrency.max(1),
            download_dir: config.download_dir,
        })
    }

    /// Exponential backoff with ±20% jitter: `initial × 2^retry`.
    fn calculate_backoff(initial: Duration, retry: u32) -> Duration {
        let backoff_ms = initial.as_millis() as u64 * 2_u64.pow(retry);
        let jitter = (backoff_ms as f64 * 0.2 * (fastrand::f64() - 0.5)) as i64;
        Duration::from_millis((backoff_ms as i64 + jitter).max(0) as u64)
    }

    /// Sends a GET and applies the retry policy. Only successful responses are returned.
    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        if !self.has_credential {
            return Err(EdinetError::MissingCredential);
        }

        let mut retries = 0;

        loop {
            self.rate_limiter.until_ready().await;

            match self.client.get(url).send().await {
                Ok(response) => match response.status() {
                    reqwest::StatusCode::OK => return Ok(response),
                    reqwest::StatusCode::NOT_FOUND => return Err(EdinetError::NotFound),
                    reqwest::StatusCode::TOO_MANY_REQUESTS => {
                        if retries >= self.max_retries {
                            return Err(EdinetError::RateLimitExceeded);
                        }

                        let computed = Self::calculate_backoff(self.initial_backoff, retries)
                            + self.rate_limit_cooldown;
                        let wait = response
                            .headers()
                            .get("retry-after")
                            .and_then(|h| h.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .map(Duration::from_secs)
                            .map_or(computed, |hinted| hinted.max(computed));

                        tracing::warn!(
                            "Rate limit hit (429) for {}. Attempt {}/{}. Waiting for {:?} before retry.",
                            url,
                            retries + 1,
                            self.max_retries + 1,
                            wait
                        );
                        sleep(wait).await;
                        retries += 1;
                    }
                    other_status => {
                        let error_body = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to read error body".to_string());

                        return Err(EdinetError::InvalidResponse(format!(
                            "Unexpected status code: {} for URL: {}. Response preview: {}",
                            other_status,
                            url,
                            error_body.chars().take(200).collect::<String>()
                        )));
                    }
                },
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                    if retries >= self.max_retries {
                        return Err(EdinetError::RequestError(e));
                    }
                    let backoff = Self::calculate_backoff(self.initial_backoff, retries);
                    tracing::warn!(
                        "Request failed for {}: {:?}. Attempt {}/{}. Retrying in {:?}.",
                        url,
                        e,
                        retries + 1,
                        self.max_retries + 1,
                        backoff
                    );
                    sleep(backoff).await;
                    retries += 1;
                }
                Err(e) => return Err(EdinetError::RequestError(e)),
            }
        }
    }

    /// Fetches text content (JSON listings) with rate limiting and retries.
    ///
    /// EDINET answers some errors with an HTML page and a 200 status. For `.json`
    /// endpoints a body that is clearly not JSON is reported as
    /// `UnexpectedContentType` with a short preview.
    ///
    /// # Errors
    ///
    /// * `EdinetError::MissingCredential` - No subscription key configured
    /// * `EdinetError::NotFound` - HTTP 404
    /// * `EdinetError::RateLimitExceeded` - 429 persisted through every retry
    /// * `EdinetError::RequestError` - Network failure after retries
    /// * `EdinetError::InvalidResponse` - Any other status
    pub async fn get(&self, url: &str) -> Result<String> {
        let response = self.fetch(url).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|val| val.to_str().ok())
            .map(str::to_lowercase);

        let body = response.text().await.map_err(EdinetError::RequestError)?;

        let is_json_endpoint = url.split('?').next().is_some_and(|path| path.ends_with(".json"));
        if is_json_endpoint {
            let trimmed = body.trim_start();
            if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
                return Err(EdinetError::UnexpectedContentType {
                    url: url.to_string(),
                    expected_pattern: "application/json".to_string(),
                    got_content_type: content_type.unwrap_or_default(),
                    content_preview: body.chars().take(200).collect(),
                });
            }
        }

        Ok(body)
    }

    /// Fetches binary data (ZIP bundles, PDFs) with rate limiting and retries.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.fetch(url).await?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(EdinetError::RequestError)
    }

    /// Returns the base URL of the EDINET API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default download directory.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Returns `true` when a subscription key is configured.
    pub fn has_credential(&self) -> bool {
        self.has_credential
    }
}
