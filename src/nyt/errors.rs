//! Error types for the article-search collector

use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("NYT API key not configured. Set NYT_API_KEY environment variable")]
    MissingApiKey,

    #[error("At least one search tag is required")]
    NoTags,

    #[error("At least one filter field is required")]
    NoFilters,

    #[error("Invalid filter field '{0}'. Supported fields: headline, lead_paragraph, body")]
    InvalidFilter(String),

    #[error("Invalid date '{0}'. Expected 8 digits (YYYYMMDD)")]
    InvalidDate(String),

    #[error("Begin date {begin} is after end date {end}")]
    InvertedRange { begin: NaiveDate, end: NaiveDate },

    #[error("Invalid API base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NYT API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse NYT response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("Aggregate file {} is missing from the output directory", .0.display())]
    MissingAggregate(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{year}-{month:02} page {page}: {source}")]
    Page {
        year: i32,
        month: u32,
        page: u32,
        #[source]
        source: Box<CollectError>,
    },
}

impl CollectError {
    /// Timeouts, connection failures, 429 and 5xx responses may succeed on
    /// a later attempt. Everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollectError::Timeout(_) => true,
            CollectError::Http(e) => e.is_timeout() || e.is_connect(),
            CollectError::ApiError { status_code, .. } => {
                *status_code == 429 || (500..600).contains(status_code)
            }
            CollectError::Page { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CollectError::MissingApiKey
                | CollectError::NoTags
                | CollectError::NoFilters
                | CollectError::InvalidFilter(_)
                | CollectError::InvalidDate(_)
                | CollectError::InvertedRange { .. }
                | CollectError::InvalidUrl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status_code: u16) -> CollectError {
        CollectError::ApiError {
            status_code,
            message: String::new(),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(api_error(429).is_retryable());
        assert!(api_error(500).is_retryable());
        assert!(api_error(503).is_retryable());
        assert!(!api_error(401).is_retryable());
        assert!(!api_error(404).is_retryable());
        assert!(CollectError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!CollectError::MissingApiKey.is_retryable());
    }

    #[test]
    fn test_config_error_classification() {
        assert!(CollectError::MissingApiKey.is_config_error());
        assert!(CollectError::NoTags.is_config_error());
        assert!(CollectError::InvalidDate("2020".into()).is_config_error());
        assert!(!api_error(401).is_config_error());
        assert!(!CollectError::Timeout(Duration::from_secs(30)).is_config_error());
    }

    #[test]
    fn test_page_context_keeps_classification() {
        let err = CollectError::Page {
            year: 2020,
            month: 6,
            page: 3,
            source: Box::new(api_error(502)),
        };
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "2020-06 page 3: NYT API error (status 502): "
        );
    }
}
