//! Line-chart series for the dashboard
//!
//! Pivots the protest-event and police-budget CSV datasets into
//! `{name, x, y, mode}` traces, written out as JSON for the chart layer.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Cities with the highest per-capita police spending
pub const DEFAULT_CITIES: [&str; 8] = [
    "Baltimore",
    "New York",
    "Chicago",
    "Detroit",
    "Atlanta",
    "Los Angeles",
    "Minneapolis",
    "Houston",
];

/// Budget rows that are not per-capita figures
const EXCLUDED_BUDGET_TYPES: [&str; 2] = ["Total", "Population"];

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Row {row}: invalid date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}: invalid number '{value}' in column '{column}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// One line trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: &'static str,
}

impl Series {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            x: Vec::new(),
            y: Vec::new(),
            mode: "lines",
        }
    }

    fn from_counts(name: &str, counts: &BTreeMap<i32, usize>) -> Self {
        let mut series = Self::new(name);
        for (year, count) in counts {
            series.x.push(year.to_string());
            series.y.push(*count as f64);
        }
        series
    }
}

/// A single protest event
#[derive(Debug, Clone, PartialEq)]
pub struct ProtestEvent {
    pub date: NaiveDate,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProtestRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "City_Town", default)]
    city: Option<String>,
}

fn parse_event_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.split_whitespace().next().unwrap_or(value);
    if let Some((_, year)) = date_part.rsplit_once('/') {
        // %Y accepts two digits as a literal year, so pick by width
        let fmt = if year.len() == 2 { "%m/%d/%y" } else { "%m/%d/%Y" };
        return NaiveDate::parse_from_str(date_part, fmt).ok();
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Read protest events; only `Date` and `City_Town` are used
pub fn load_protests<R: Read>(reader: R) -> Result<Vec<ProtestEvent>, SeriesError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut events = Vec::new();

    for (index, record) in csv_reader.deserialize::<ProtestRecord>().enumerate() {
        let record = record?;
        let row = index + 2;
        let date = parse_event_date(&record.date).ok_or_else(|| SeriesError::InvalidDate {
            row,
            value: record.date.clone(),
        })?;
        let city = record
            .city
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        events.push(ProtestEvent { date, city });
    }

    Ok(events)
}

pub fn load_protests_from_path(path: &Path) -> Result<Vec<ProtestEvent>, SeriesError> {
    load_protests(File::open(path)?)
}

/// `National` (all events per year), then one series per city in
/// alphabetical order
pub fn protests_by_year(events: &[ProtestEvent], cities: &[&str]) -> Vec<Series> {
    let mut national: BTreeMap<i32, usize> = BTreeMap::new();
    let mut by_city: BTreeMap<&str, BTreeMap<i32, usize>> =
        cities.iter().map(|c| (*c, BTreeMap::new())).collect();

    for event in events {
        let year = event.date.year();
        *national.entry(year).or_default() += 1;
        if let Some(counts) = event.city.as_deref().and_then(|c| by_city.get_mut(c)) {
            *counts.entry(year).or_default() += 1;
        }
    }

    let mut series = vec![Series::from_counts("National", &national)];
    series.extend(
        by_city
            .iter()
            .map(|(city, counts)| Series::from_counts(city, counts)),
    );
    series
}

/// Per-capita budget series, one per city in first-appearance order.
///
/// Expects `City`, `Type` and one column per year. `Total` and `Population`
/// rows are skipped, as are blank cells.
pub fn budget_per_capita<R: Read>(reader: R) -> Result<Vec<Series>, SeriesError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| SeriesError::MissingColumn(name.to_string()))
    };
    let city_idx = column("City")?;
    let type_idx = column("Type")?;
    let year_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != city_idx && *i != type_idx)
        .map(|(i, h)| (i, h.trim()))
        .collect();

    let mut series: Vec<Series> = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = index + 2;
        let row_type = record.get(type_idx).unwrap_or("").trim();
        if EXCLUDED_BUDGET_TYPES.contains(&row_type) {
            continue;
        }

        let city = record.get(city_idx).unwrap_or("").trim();
        let position = match series.iter().position(|s| s.name == city) {
            Some(position) => position,
            None => {
                series.push(Series::new(city));
                series.len() - 1
            }
        };

        for (i, year) in &year_columns {
            let raw = record.get(*i).unwrap_or("").trim();
            if raw.is_empty() {
                continue;
            }
            let value = parse_amount(raw).ok_or_else(|| SeriesError::InvalidNumber {
                row,
                column: year.to_string(),
                value: raw.to_string(),
            })?;
            series[position].x.push(year.to_string());
            series[position].y.push(value);
        }
    }

    Ok(series)
}

pub fn budget_per_capita_from_path(path: &Path) -> Result<Vec<Series>, SeriesError> {
    budget_per_capita(File::open(path)?)
}

/// `$1,234.50` -> 1234.5
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    cleaned.trim().parse().ok()
}

/// Write series as pretty-printed JSON
pub fn write_series(path: &Path, series: &[Series]) -> Result<(), SeriesError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, series)?;
    info!("Wrote {} series to {}", series.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROTESTS: &str = "\
Location,Date,County,StateTerritory,City_Town
\"Chicago, IL\",2017-01-21,Cook County,IL,Chicago
\"Chicago, IL\",2017-03-08,Cook County,IL,Chicago
\"Detroit, MI\",2018-05-01,Wayne County,MI,Detroit
\"Portland, OR\",2018-06-02,Multnomah County,OR,Portland
\"Atlanta, GA\",06/01/2020,Fulton County,GA,Atlanta
\"Houston, TX\",06/01/20,Harris County,TX,Houston
";

    #[test]
    fn test_load_protests() {
        let events = load_protests(PROTESTS.as_bytes()).unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0].city.as_deref(), Some("Chicago"));
        assert_eq!(events[4].date, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap());
        assert_eq!(events[5].date, NaiveDate::from_ymd_opt(2020, 6, 1).unwrap());
    }

    #[test]
    fn test_event_date_formats() {
        let june_first = NaiveDate::from_ymd_opt(2020, 6, 1);
        assert_eq!(parse_event_date("2020-06-01"), june_first);
        assert_eq!(parse_event_date("06/01/2020"), june_first);
        assert_eq!(parse_event_date("06/01/20"), june_first);
        assert_eq!(parse_event_date("2020-06-01 14:30:00"), june_first);
        assert_eq!(parse_event_date("06/01/202"), None);
    }

    #[test]
    fn test_invalid_date_names_row() {
        let csv = "Date,City_Town\n2017-01-21,Chicago\nyesterday,Detroit\n";
        let err = load_protests(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidDate { row: 3, .. }));
    }

    #[test]
    fn test_protests_by_year() {
        let events = load_protests(PROTESTS.as_bytes()).unwrap();
        let series = protests_by_year(&events, &["Detroit", "Chicago", "Houston"]);

        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["National", "Chicago", "Detroit", "Houston"]);

        assert_eq!(series[0].x, ["2017", "2018", "2020"]);
        assert_eq!(series[0].y, [2.0, 2.0, 2.0]);
        assert_eq!(series[1].x, ["2017"]);
        assert_eq!(series[1].y, [2.0]);
        assert_eq!(series[2].x, ["2018"]);
        assert_eq!(series[3].x, ["2020"]);
        assert!(series.iter().all(|s| s.mode == "lines"));
    }

    #[test]
    fn test_budget_per_capita() {
        let csv = "\
City,Type,2017,2018,2019
Chicago,Total,\"1,500,000,000\",\"1,550,000,000\",\"1,600,000,000\"
Chicago,Population,2700000,2705000,2690000
Chicago,Per Capita,$555.56,$573.01,594.80
Houston,Per Capita,400.5,,410.25
";
        let series = budget_per_capita(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Chicago");
        assert_eq!(series[0].x, ["2017", "2018", "2019"]);
        assert_eq!(series[0].y, [555.56, 573.01, 594.80]);
        assert_eq!(series[1].name, "Houston");
        assert_eq!(series[1].x, ["2017", "2019"]);
    }

    #[test]
    fn test_budget_missing_column() {
        let csv = "City,2017\nChicago,1\n";
        let err = budget_per_capita(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SeriesError::MissingColumn(ref c) if c == "Type"));
    }

    #[test]
    fn test_write_series() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("charts").join("protests.json");
        let events = load_protests(PROTESTS.as_bytes()).unwrap();
        write_series(&path, &protests_by_year(&events, &DEFAULT_CITIES)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 9);
        assert_eq!(written[0]["name"], "National");
        assert_eq!(written[0]["mode"], "lines");
    }
}
