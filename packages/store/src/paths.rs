#![allow(clippy::module_name_repetitions)]
//! Canonical file names inside a scrape output directory.
//!
//! A run writes into `<root>/Data-<DDMon>/` (for example `Data-22Jun`):
//!
//! ```text
//! Data-22Jun/
//! ├── peak_ratings_sea.csv
//! ├── season_ratings_sea.csv
//! ├── peak_ratings_global.csv      (global runs)
//! ├── season_ratings_global.csv    (global runs)
//! ├── last_page.txt                / last_page_global.txt
//! └── failed_pages.txt             / failed_pages_global.txt
//! ```

use std::path::{Path, PathBuf};

use bh_ladder_models::{Metric, Region};
use chrono::NaiveDate;

use crate::StoreError;

/// Whether the state files belong to a single-region run or a global run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One region scraped on its own.
    Regional,
    /// Every region scraped in turn, plus the combined output.
    Global,
}

impl RunMode {
    /// Checkpoint file name for this mode.
    #[must_use]
    pub const fn checkpoint_file(self) -> &'static str {
        match self {
            Self::Regional => "last_page.txt",
            Self::Global => "last_page_global.txt",
        }
    }

    /// Failure log file name for this mode.
    #[must_use]
    pub const fn failure_file(self) -> &'static str {
        match self {
            Self::Regional => "failed_pages.txt",
            Self::Global => "failed_pages_global.txt",
        }
    }
}

/// Which CSV pair a row is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputScope {
    /// The per-region files.
    Region(Region),
    /// The combined files produced by the global driver.
    Global,
}

impl OutputScope {
    /// File name suffix (`sea`, `us-e`, `global`).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Region(region) => region.code(),
            Self::Global => "global",
        }
    }
}

/// Returns the date-stamped folder name for `date`, e.g. `Data-22Jun`.
#[must_use]
pub fn dated_dir_name(date: NaiveDate) -> String {
    format!("Data-{}", date.format("%d%b"))
}

/// Returns `<root>/Data-<DDMon>` for `date`.
#[must_use]
pub fn dated_dir(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(dated_dir_name(date))
}

/// Returns `<root>/Data-<DDMon>` for today's local date.
#[must_use]
pub fn today_dir(root: &Path) -> PathBuf {
    dated_dir(root, chrono::Local::now().date_naive())
}

/// Returns the CSV path for `metric` in `scope`, e.g.
/// `peak_ratings_sea.csv`.
#[must_use]
pub fn ratings_csv(dir: &Path, scope: OutputScope, metric: Metric) -> PathBuf {
    dir.join(format!("{}_{}.csv", metric.file_stem(), scope.suffix()))
}

/// Returns the checkpoint file path for `mode`.
#[must_use]
pub fn checkpoint_path(dir: &Path, mode: RunMode) -> PathBuf {
    dir.join(mode.checkpoint_file())
}

/// Returns the failure log path for `mode`.
#[must_use]
pub fn failure_log_path(dir: &Path, mode: RunMode) -> PathBuf {
    dir.join(mode.failure_file())
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StoreError::io(path, e))?;
    }
    Ok(())
}
