#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! On-disk state for leaderboard scrapes.
//!
//! Three stores live side by side in one date-stamped output directory:
//!
//! * [`csv_writer::CsvWriter`] appends rating rows to per-region (and
//!   global) CSV files, one file per [`Metric`](bh_ladder_models::Metric).
//! * [`checkpoint::CheckpointStore`] remembers the last committed page per
//!   region so a new run resumes instead of restarting.
//! * [`failure_log::FailureLog`] lists pages that failed to fetch so a later
//!   retry run can pick them up.
//!
//! Every write error surfaces as a [`StoreError`]; callers treat these as
//! fatal because the resume invariant cannot be trusted afterwards.

pub mod checkpoint;
pub mod csv_writer;
pub mod failure_log;
pub mod paths;

use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Errors that can occur while reading or writing scrape state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A file system operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Reading or writing CSV rows failed.
    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        /// CSV file being accessed.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Atomically replaces `path` with `contents`.
///
/// Writes to a sibling `.tmp` file, syncs it, then renames it over the
/// target so readers only ever see the old or the new contents.
pub(crate) fn replace_file(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    {
        let mut file = std::fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(contents)
            .map_err(|e| StoreError::io(&tmp, e))?;
        file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
    }

    std::fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))
}

/// Reads `path` to a string, treating a missing file as empty.
pub(crate) fn read_optional(path: &Path) -> Result<String, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
