//! On-disk layout for collected search pages
//!
//! Pages live under `<root>/<YYYY>/<MonthName>/<prefix>_<page>.json`. The
//! root also holds the aggregate CSV consumed by the dashboard; it is never
//! removed by [`ArtifactStore::reset`].

use chrono::Month;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::{FetchWindow, PageResult};
use crate::nyt::CollectError;

/// Pages found on disk for one (year, month) directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInventory {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub pages: usize,
    pub last_page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    aggregate_file: String,
    prefix: String,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, aggregate_file: &str, prefix: &str) -> Self {
        Self {
            root: root.into(),
            aggregate_file: aggregate_file.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.output_dir,
            &config.aggregate_file,
            &config.artifact_prefix,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.root.join(&self.aggregate_file)
    }

    /// Remove every subdirectory of the root left by a previous run.
    ///
    /// Files directly under the root are kept. The aggregate file must be
    /// present whenever the root exists; a missing one fails the reset
    /// before anything is deleted. Returns the removed directories.
    pub fn reset(&self) -> Result<Vec<PathBuf>, CollectError> {
        if !self.root.exists() {
            info!("Output directory {} does not exist yet, creating it", self.root.display());
            fs::create_dir_all(&self.root)?;
            return Ok(Vec::new());
        }

        let aggregate = self.aggregate_path();
        if !aggregate.is_file() {
            return Err(CollectError::MissingAggregate(aggregate));
        }

        let mut removed = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                debug!("Removing {}", path.display());
                fs::remove_dir_all(&path)?;
                removed.push(path);
            }
        }
        removed.sort();

        info!(
            "Reset {}: removed {} directories, kept {}",
            self.root.display(),
            removed.len(),
            self.aggregate_file
        );
        Ok(removed)
    }

    pub fn window_dir(&self, window: &FetchWindow) -> PathBuf {
        self.root
            .join(window.year.to_string())
            .join(window.month_name())
    }

    /// Create the window's directory (and parents) if absent
    pub fn ensure_window_dir(&self, window: &FetchWindow) -> Result<PathBuf, CollectError> {
        let dir = self.window_dir(window);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn artifact_path(&self, window: &FetchWindow, page: u32) -> PathBuf {
        self.window_dir(window)
            .join(format!("{}_{}.json", self.prefix, page))
    }

    /// Write one page as pretty-printed JSON, replacing any existing file.
    /// The write is not atomic.
    pub fn write_page(&self, page: &PageResult) -> Result<PathBuf, CollectError> {
        let path = self.artifact_path(&page.window, page.page);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&page.body)?;
        fs::write(&path, json)?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Page files currently on disk, grouped by window, in calendar order.
    /// Directories that are not `<year>/<MonthName>` are ignored.
    pub fn inventory(&self) -> Result<Vec<WindowInventory>, CollectError> {
        let mut windows: BTreeMap<(i32, u32), WindowInventory> = BTreeMap::new();
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        for entry in WalkDir::new(&self.root).min_depth(3).max_depth(3) {
            let entry = entry.map_err(|e| CollectError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(page) = self.page_index(entry.path()) else {
                continue;
            };
            let Some((year, month, month_name)) = window_of(entry.path()) else {
                continue;
            };

            let slot = windows.entry((year, month)).or_insert_with(|| WindowInventory {
                year,
                month,
                month_name,
                pages: 0,
                last_page: None,
            });
            slot.pages += 1;
            slot.last_page = slot.last_page.max(Some(page));
        }

        Ok(windows.into_values().collect())
    }

    /// `<prefix>_<n>.json` -> n
    fn page_index(&self, path: &Path) -> Option<u32> {
        let name = path.file_name()?.to_str()?;
        name.strip_suffix(".json")?
            .strip_prefix(&self.prefix)?
            .strip_prefix('_')?
            .parse()
            .ok()
    }
}

/// `.../<year>/<MonthName>/file` -> (year, month number, month name)
fn window_of(path: &Path) -> Option<(i32, u32, String)> {
    let month_dir = path.parent()?;
    let year_dir = month_dir.parent()?;
    let month_name = month_dir.file_name()?.to_str()?.to_string();
    let year: i32 = year_dir.file_name()?.to_str()?.parse().ok()?;
    let month: Month = month_name.parse().ok()?;
    Some((year, month.number_from_month(), month_name))
}
