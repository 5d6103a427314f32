//! NYT Article Search API response shapes and constants

use serde::Deserialize;

/// The only part of a search response the collector reads.
/// Everything else in the payload is passed through untouched.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub response: SearchBody,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub meta: SearchMeta,
}

#[derive(Debug, Deserialize)]
pub struct SearchMeta {
    /// Total number of articles matching the query
    pub hits: u64,
}

/// NYT API endpoints and constants
pub struct NytApi;

impl NytApi {
    /// Base URL for the NYT developer APIs
    pub const BASE_URL: &'static str = "https://api.nytimes.com";
    /// Article search endpoint
    pub const ARTICLE_SEARCH_ENDPOINT: &'static str = "/svc/search/v2/articlesearch.json";
    /// Results per page, fixed by the provider
    pub const PAGE_SIZE: u64 = 10;
}

/// Index of the last page requested for `hits` results.
///
/// This is `hits / PAGE_SIZE`, so when `hits` is an exact multiple of the
/// page size one trailing empty page is requested as well.
pub fn last_page_index(hits: u64) -> u64 {
    hits / NytApi::PAGE_SIZE
}
