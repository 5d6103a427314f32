//! Month-by-month collection of article search pages

use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{FetchWindow, PageResult, QueryConfig};
use crate::nyt::fetcher::RateLimitedFetcher;
use crate::nyt::query::SearchRequest;
use crate::nyt::{last_page_index, CollectError, SearchResponse};
use crate::storage::ArtifactStore;

/// Counts for one collected window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSummary {
    pub window: FetchWindow,
    pub hits: u64,
    pub pages: u32,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub windows: Vec<WindowSummary>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn pages_written(&self) -> u32 {
        self.windows.iter().map(|w| w.pages).sum()
    }

    pub fn total_hits(&self) -> u64 {
        self.windows.iter().map(|w| w.hits).sum()
    }
}

/// Walks every month of a query, fetching all pages and writing them out
pub struct Collector {
    query: QueryConfig,
    base_url: String,
    api_key: String,
    fetcher: RateLimitedFetcher,
    store: ArtifactStore,
}

impl Collector {
    pub fn new(
        query: QueryConfig,
        base_url: &str,
        api_key: &str,
        fetcher: RateLimitedFetcher,
        store: ArtifactStore,
    ) -> Self {
        Self {
            query,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            fetcher,
            store,
        }
    }

    /// Collector wired to the live API. Fails without an API key.
    pub fn from_config(query: QueryConfig, config: &Config) -> Result<Self, CollectError> {
        let api_key = config.require_api_key()?;
        let fetcher = RateLimitedFetcher::from_config(config)?;
        Ok(Self::new(
            query,
            &config.api_base_url,
            api_key,
            fetcher,
            ArtifactStore::from_config(config),
        ))
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Collect every window in order. The first failing page aborts the run;
    /// the error names its window and page.
    pub async fn run(&mut self) -> Result<RunSummary, CollectError> {
        let start_time = Instant::now();
        let windows = self.query.windows();
        info!(
            "Collecting {} monthly windows from {} to {}",
            windows.len(),
            self.query.begin,
            self.query.end
        );

        let mut summaries = Vec::with_capacity(windows.len());
        for (index, window) in windows.iter().enumerate() {
            let summary = self.collect_window(window).await?;
            info!(
                "Window {} ({}/{}): {} hits, {} pages written",
                window,
                index + 1,
                windows.len(),
                summary.hits,
                summary.pages
            );
            summaries.push(summary);
        }

        let summary = RunSummary {
            windows: summaries,
            elapsed: start_time.elapsed(),
        };
        info!(
            "Collection complete: {} pages, {} hits, {} minutes {} seconds",
            summary.pages_written(),
            summary.total_hits(),
            summary.elapsed.as_secs() / 60,
            summary.elapsed.as_secs() % 60
        );
        Ok(summary)
    }

    /// Fetch page 0, read the hit count, then fetch pages `1..=hits / 10`
    pub async fn collect_window(&mut self, window: &FetchWindow) -> Result<WindowSummary, CollectError> {
        self.store.ensure_window_dir(window)?;

        let first = self.fetch_page(window, 0).await?;
        let hits = first.hits.unwrap_or(0);
        self.write(&first)?;

        let last_page = u32::try_from(last_page_index(hits)).unwrap_or(u32::MAX);
        debug!("{}: {} hits, requesting pages 1..={}", window, hits, last_page);

        for page in 1..=last_page {
            let result = self.fetch_page(window, page).await?;
            self.write(&result)?;
        }

        Ok(WindowSummary {
            window: *window,
            hits,
            pages: last_page + 1,
        })
    }

    async fn fetch_page(&mut self, window: &FetchWindow, page: u32) -> Result<PageResult, CollectError> {
        self.try_fetch_page(window, page)
            .await
            .map_err(|e| in_context(e, window, page))
    }

    async fn try_fetch_page(&mut self, window: &FetchWindow, page: u32) -> Result<PageResult, CollectError> {
        let begin_date = window.begin_param();
        let end_date = window.end_param();
        let request = SearchRequest {
            tags: &self.query.tags,
            filters: &self.query.filters,
            begin_date: &begin_date,
            end_date: &end_date,
            page,
        };
        let url = request.to_url(&self.base_url, &self.api_key)?;

        let text = self.fetcher.fetch(&url).await?;
        let body: serde_json::Value = serde_json::from_str(&text)?;
        let hits = if page == 0 {
            Some(SearchResponse::deserialize(&body)?.response.meta.hits)
        } else {
            None
        };

        Ok(PageResult {
            window: *window,
            page,
            hits,
            body,
        })
    }

    fn write(&self, result: &PageResult) -> Result<(), CollectError> {
        self.store
            .write_page(result)
            .map(|_| ())
            .map_err(|e| in_context(e, &result.window, result.page))
    }
}

fn in_context(error: CollectError, window: &FetchWindow, page: u32) -> CollectError {
    CollectError::Page {
        year: window.year,
        month: window.month,
        page,
        source: Box::new(error),
    }
}
