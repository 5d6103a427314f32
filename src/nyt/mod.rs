//! NYT Article Search collection
//!
//! Fetches every page of an article search, one calendar month at a time,
//! and writes each page to disk as JSON. Requests are strictly sequential
//! and spaced by a fixed interval to stay under the API's rate limit.

pub mod collector;
pub mod errors;
pub mod fetcher;
pub mod query;
pub mod types;

pub use collector::{Collector, RunSummary, WindowSummary};
pub use errors::CollectError;
pub use fetcher::{Clock, HttpResponse, RateLimitedFetcher, RateLimiter, RetryPolicy, Transport};
pub use query::SearchRequest;
pub use types::*;

use tracing::info;

use crate::config::Config;
use crate::models::QueryConfig;

/// Collect all pages for `query` into the configured output directory.
///
/// With `reset` set, directories from a previous run are removed first.
/// Configuration problems are reported before anything is deleted or
/// requested.
pub async fn collect(query: QueryConfig, config: &Config, reset: bool) -> Result<RunSummary, CollectError> {
    let mut collector = Collector::from_config(query, config)?;

    if reset {
        let removed = collector.store().reset()?;
        info!("Removed {} directories from previous run", removed.len());
    }

    collector.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterField;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_api_key_leaves_previous_run_intact() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("nyt_articles.csv"), "headline\n").unwrap();
        let stale = root.join("2019").join("May");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("NYT_0.json"), "{}").unwrap();

        let config = Config {
            output_dir: root.to_path_buf(),
            nyt_api_key: None,
            ..Config::default()
        };
        let query = QueryConfig::new(
            vec!["protest".to_string()],
            vec![FilterField::Headline],
            "20200101",
            "20200131",
        )
        .unwrap();

        let result = collect(query, &config, true).await;
        assert!(matches!(result, Err(CollectError::MissingApiKey)));
        assert!(stale.join("NYT_0.json").is_file());
        assert!(root.join("nyt_articles.csv").is_file());
    }
}
