//! Data collection and chart preparation for the protest news-coverage
//! project.
//!
//! - [`nyt`] pages through the NYT Article Search API one month at a time
//!   and writes every page to disk.
//! - [`storage`] owns the on-disk layout of those pages.
//! - [`series`] turns the project's CSV datasets into line-chart series.

pub mod config;
pub mod models;
pub mod nyt;
pub mod series;
pub mod storage;
