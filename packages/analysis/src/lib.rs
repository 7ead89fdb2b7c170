#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline analysis of scraped ratings CSVs.
//!
//! Everything here reads the `rating` column of the files written by
//! `bh_ladder_store`: percentile lookups ([`distribution`]), the tier and
//! top-bracket tables ([`tables`]), and rating-ordered copies of the CSVs
//! ([`sort`]).

pub mod distribution;
pub mod sort;
pub mod tables;

use std::path::PathBuf;

use bh_ladder_store::StoreError;
use thiserror::Error;

/// Errors that can occur while analysing ratings files.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Reading or writing a CSV failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The file holds no ratings.
    #[error("{} contains no ratings", .path.display())]
    Empty {
        /// The empty file.
        path: PathBuf,
    },

    /// The path is neither a `.csv` file nor a directory.
    #[error("{} is not a .csv file or a directory", .path.display())]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
    },

    /// A directory was given but holds no `.csv` files.
    #[error("no .csv files found in {}", .path.display())]
    NoCsvFiles {
        /// The directory searched.
        path: PathBuf,
    },
}
