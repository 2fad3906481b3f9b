use std::path::PathBuf;
use std::time::Duration;

/// Default EDINET v2 API root.
pub const DEFAULT_BASE_URL: &str = "https://api.edinet-fsa.go.jp/api/v2";

/// Configuration for the Edinet client
#[derive(Debug, Clone)]
pub struct EdinetConfig {
    /// Subscription key sent with every request. `None` leaves the client usable
    /// for local work while every remote call reports `MissingCredential`.
    pub api_key: Option<String>,
    /// Base URL of the EDINET API
    pub base_url: String,
    /// Rate limit in requests per second
    pub rate_limit: u32,
    /// HTTP request timeout (per request, not per logical search)
    pub timeout: Duration,
    /// Retry budget for rate-limit responses and transient network errors
    pub max_retries: u32,
    /// First backoff step; doubled on each retry
    pub initial_backoff: Duration,
    /// Extra wait added on top of the backoff after an HTTP 429
    pub rate_limit_cooldown: Duration,
    /// How many listing dates are requested concurrently
    pub concurrency: usize,
    /// Where downloaded bundles and PDFs are kept
    pub download_dir: PathBuf,
}

impl Default for EdinetConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit: 3,
            timeout: Duration::from_secs(60),
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
            rate_limit_cooldown: Duration::from_secs(60),
            concurrency: 4,
            download_dir: PathBuf::from("cache").join("edinet"),
        }
    }
}

impl EdinetConfig {
    /// Creates a new EdinetConfig with the given key and default tuning.
    ///
    /// ```rust
    /// use edinetkit::EdinetConfig;
    /// use std::time::Duration;
    ///
    /// let config = EdinetConfig::new("my-subscription-key")
    ///     .with_rate_limit(2)
    ///     .with_timeout(Duration::from_secs(30));
    /// assert_eq!(config.rate_limit, 2);
    /// ```
    pub fn new(api_key: impl Into<String>) -> Self {
        let key = api_key.into().trim().to_string();
        Self {
            api_key: (!key.is_empty()).then_some(key),
            ..Default::default()
        }
    }

    /// Reads configuration from the process environment, loading `.env` first.
    ///
    /// Recognized variables: `EDINET_API_KEY`, `EDINET_BASE_URL`,
    /// `EDINET_RATE_LIMIT` and `CACHE_DIR`. Unset or unparsable values keep
    /// their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = Self::default();

        config.api_key = std::env::var("EDINET_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if let Ok(url) = std::env::var("EDINET_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(rate) = std::env::var("EDINET_RATE_LIMIT")
            .ok()
            .and_then(|r| r.parse::<u32>().ok())
        {
            config.rate_limit = rate;
        }

        if let Ok(dir) = std::env::var("CACHE_DIR") {
            config.download_dir = PathBuf::from(dir).join("edinet");
        }

        if config.api_key.is_none() {
            tracing::warn!("EDINET_API_KEY is not set; filing discovery and downloads are unavailable");
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}
