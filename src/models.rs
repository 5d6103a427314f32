use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::nyt::CollectError;

/// Article section the search tags are matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Headline,
    LeadParagraph,
    Body,
}

impl FilterField {
    pub fn as_str(&self) -> &str {
        match self {
            FilterField::Headline => "headline",
            FilterField::LeadParagraph => "lead_paragraph",
            FilterField::Body => "body",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterField {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "headline" => Ok(FilterField::Headline),
            "lead_paragraph" | "lead-paragraph" => Ok(FilterField::LeadParagraph),
            "body" => Ok(FilterField::Body),
            other => Err(CollectError::InvalidFilter(other.to_string())),
        }
    }
}

/// Parse an 8-digit `YYYYMMDD` date. Dashes are stripped first so
/// `2020-06-01` is accepted as well.
pub fn parse_compact_date(value: &str) -> Result<NaiveDate, CollectError> {
    let digits: String = value.trim().chars().filter(|c| *c != '-').collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CollectError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(&digits, "%Y%m%d")
        .map_err(|_| CollectError::InvalidDate(value.to_string()))
}

/// Search parameters for one collection run. Built once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub tags: Vec<String>,
    pub filters: Vec<FilterField>,
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl QueryConfig {
    pub fn new(
        tags: Vec<String>,
        filters: Vec<FilterField>,
        begin_date: &str,
        end_date: &str,
    ) -> Result<Self, CollectError> {
        let tags: Vec<String> = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(CollectError::NoTags);
        }
        if filters.is_empty() {
            return Err(CollectError::NoFilters);
        }

        let begin = parse_compact_date(begin_date)?;
        let end = parse_compact_date(end_date)?;
        if begin > end {
            return Err(CollectError::InvertedRange { begin, end });
        }

        Ok(Self {
            tags,
            filters,
            begin,
            end,
        })
    }

    /// Every (year, month) between `begin` and `end` inclusive, in order.
    /// The first and last windows are clipped to the configured range.
    pub fn windows(&self) -> Vec<FetchWindow> {
        let mut windows = Vec::new();
        let mut cursor = self.begin.with_day(1);

        while let Some(first) = cursor {
            if first > self.end {
                break;
            }
            let next = first.checked_add_months(Months::new(1));
            let last = next.and_then(|d| d.pred_opt()).unwrap_or(NaiveDate::MAX);

            windows.push(FetchWindow {
                year: first.year(),
                month: first.month(),
                begin: first.max(self.begin),
                end: last.min(self.end),
            });
            cursor = next;
        }

        windows
    }
}

/// One calendar month of the query range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchWindow {
    pub year: i32,
    pub month: u32,
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// English month name used for the output directory, e.g. `March`
    pub fn month_name(&self) -> String {
        self.begin.format("%B").to_string()
    }

    pub fn begin_param(&self) -> String {
        self.begin.format("%Y%m%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// One page of search results, kept only until it is written to disk
#[derive(Debug, Clone)]
pub struct PageResult {
    pub window: FetchWindow,
    pub page: u32,
    /// Total hits reported by the API; only read from page 0
    pub hits: Option<u64>,
    pub body: serde_json::Value,
}
