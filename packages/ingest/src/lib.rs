#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Resumable leaderboard ingestion.
//!
//! * [`scrape::scrape_region`] walks one region's pages from its checkpoint
//!   until the leaderboard runs dry, committing each page to CSV before
//!   advancing.
//! * [`retry::retry_region`] re-fetches pages listed in the failure log.
//! * [`global`] runs the scrape for every region and concatenates the
//!   per-region CSVs into the combined `*_global.csv` pair.
//!
//! All loops take an explicit [`config::LoopSettings`] and a [`RunState`]
//! rather than reading process-wide settings.

pub mod config;
pub mod global;
pub mod retry;
pub mod scrape;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use bh_ladder_models::{PageIndex, Region};
use bh_ladder_scraper::ScrapeError;
use bh_ladder_store::checkpoint::CheckpointStore;
use bh_ladder_store::csv_writer::CsvWriter;
use bh_ladder_store::failure_log::FailureLog;
use bh_ladder_store::paths::{self, RunMode};
use bh_ladder_store::StoreError;

/// Errors that abort an ingestion run.
///
/// Fetch failures never show up here; they are deferred to the failure
/// log. Everything below means on-disk state could not be read or kept
/// consistent, so the run stops.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The checkpoint for a region could not be read.
    #[error("failed to read checkpoint for region {region}: {source}")]
    Checkpoint {
        /// Region being resumed.
        region: Region,
        /// Underlying store error.
        source: StoreError,
    },

    /// A fetched page could not be written to CSV or checkpointed.
    #[error("failed to commit page {page} for region {region}: {source}")]
    Commit {
        /// Region being scraped.
        region: Region,
        /// Page being committed.
        page: PageIndex,
        /// Underlying store error.
        source: StoreError,
    },

    /// The failure log could not be updated for a page.
    #[error("failed to update failure log for region {region} page {page}: {source}")]
    FailureLog {
        /// Region being scraped.
        region: Region,
        /// Page being recorded or removed.
        page: PageIndex,
        /// Underlying store error.
        source: StoreError,
    },

    /// Any other store operation failed (directory creation, aggregation,
    /// reading the failure log).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The page fetcher could not be constructed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// The on-disk stores of one output directory.
#[derive(Debug)]
pub struct RunState {
    /// Ratings CSV writer.
    pub csv: CsvWriter,
    /// Per-region last committed page.
    pub checkpoints: CheckpointStore,
    /// Pages waiting to be retried.
    pub failures: FailureLog,
}

impl RunState {
    /// Opens (creating if necessary) the output directory `dir` and binds
    /// the checkpoint and failure files for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>, mode: RunMode) -> Result<Self, IngestError> {
        let dir = dir.into();
        paths::ensure_dir(&dir)?;

        Ok(Self {
            csv: CsvWriter::new(&dir),
            checkpoints: CheckpointStore::new(paths::checkpoint_path(&dir, mode), mode),
            failures: FailureLog::new(paths::failure_log_path(&dir, mode)),
        })
    }
}
