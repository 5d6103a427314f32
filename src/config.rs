//! Centralized configuration management for protest-news

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::nyt::{CollectError, NytApi, RetryPolicy};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for collected pages
    pub output_dir: PathBuf,
    /// Aggregate CSV under `output_dir` that resets never delete
    pub aggregate_file: String,
    /// File name prefix for page artifacts (`<prefix>_<page>.json`)
    pub artifact_prefix: String,
    /// NYT API key (required for collection)
    pub nyt_api_key: Option<String>,
    /// Base URL of the NYT API
    pub api_base_url: String,
    /// Rate limiting configuration
    pub rate_limits: RateLimits,
    /// Retry configuration for transient failures
    pub retry: RetryConfig,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimits {
    /// Minimum time between the start of two API requests (milliseconds).
    /// The article search API allows 10 requests per minute.
    pub request_interval_ms: u64,
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay
    pub max_delay_ms: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            request_interval_ms: 6000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "protest-news/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./raw_data"),
            aggregate_file: "nyt_articles.csv".to_string(),
            artifact_prefix: "nyt".to_string(),
            nyt_api_key: None,
            api_base_url: NytApi::BASE_URL.to_string(),
            rate_limits: RateLimits::default(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let output_dir = std::env::var("PROTEST_NEWS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let aggregate_file = std::env::var("PROTEST_NEWS_AGGREGATE_FILE")
            .unwrap_or(defaults.aggregate_file);

        let artifact_prefix = std::env::var("PROTEST_NEWS_ARTIFACT_PREFIX")
            .unwrap_or(defaults.artifact_prefix);

        let nyt_api_key = std::env::var("NYT_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let api_base_url = std::env::var("PROTEST_NEWS_API_BASE_URL")
            .unwrap_or(defaults.api_base_url);

        let rate_limits = RateLimits {
            request_interval_ms: parse_env_var("PROTEST_NEWS_REQUEST_INTERVAL_MS")?
                .unwrap_or(defaults.rate_limits.request_interval_ms),
        };

        let retry = RetryConfig {
            max_retries: parse_env_var("PROTEST_NEWS_MAX_RETRIES")?
                .unwrap_or(defaults.retry.max_retries),
            base_delay_ms: parse_env_var("PROTEST_NEWS_RETRY_BASE_DELAY_MS")?
                .unwrap_or(defaults.retry.base_delay_ms),
            max_delay_ms: parse_env_var("PROTEST_NEWS_RETRY_MAX_DELAY_MS")?
                .unwrap_or(defaults.retry.max_delay_ms),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("PROTEST_NEWS_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("PROTEST_NEWS_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            output_dir,
            aggregate_file,
            artifact_prefix,
            nyt_api_key,
            api_base_url,
            rate_limits,
            retry,
            http,
        })
    }

    /// API key, or [`CollectError::MissingApiKey`]
    pub fn require_api_key(&self) -> Result<&str, CollectError> {
        self.nyt_api_key.as_deref().ok_or(CollectError::MissingApiKey)
    }

    /// Minimum spacing between requests as Duration
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limits.request_interval_ms)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.artifact_prefix.is_empty() {
            return Err(anyhow::anyhow!("Artifact prefix must not be empty"));
        }
        if self.aggregate_file.is_empty() {
            return Err(anyhow::anyhow!("Aggregate file name must not be empty"));
        }
        url::Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.api_base_url))?;

        if let Some(parent) = self.output_dir.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Parent of output directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("./raw_data"));
        assert_eq!(config.aggregate_file, "nyt_articles.csv");
        assert_eq!(config.artifact_prefix, "nyt");
        assert_eq!(config.request_interval(), Duration::from_secs(6));
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_missing_api_key() {
        let config = Config::default();
        assert!(matches!(
            config.require_api_key(),
            Err(CollectError::MissingApiKey)
        ));

        let config = Config {
            nyt_api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "key");
    }

    #[test]
    fn test_parse_env_var() {
        std::env::set_var("PROTEST_NEWS_TEST_PARSE_OK", "250");
        std::env::set_var("PROTEST_NEWS_TEST_PARSE_BAD", "soon");

        let ok: Option<u64> = parse_env_var("PROTEST_NEWS_TEST_PARSE_OK").unwrap();
        assert_eq!(ok, Some(250));
        assert!(parse_env_var::<u64>("PROTEST_NEWS_TEST_PARSE_BAD").is_err());
        assert_eq!(parse_env_var::<u64>("PROTEST_NEWS_TEST_PARSE_UNSET").unwrap(), None);
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
