#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core types shared across the leaderboard toolchain.
//!
//! A fetched page decodes into [`LeaderboardEntry`] values, each of which
//! carries both the peak and the season rating of one player. Entries are
//! split into one [`RatingRecord`] per [`Metric`] before they are written to
//! CSV, so every output file has the same `rank,player,rating,region` shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// 1-based leaderboard page index.
pub type PageIndex = u32;

/// A leaderboard server region.
///
/// Parsing is case-insensitive so both the lowercase URL codes (`sea`) and
/// the uppercase codes used in payloads (`SEA`) are accepted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Region {
    /// US East
    UsE,
    /// Europe
    Eu,
    /// Southeast Asia
    #[default]
    Sea,
    /// Brazil
    Brz,
    /// Australia
    Aus,
    /// US West
    UsW,
    /// Japan
    Jpn,
    /// South Africa
    Sa,
    /// Middle East
    Me,
}

impl Region {
    /// Every known region, in the order the global driver visits them.
    pub const ALL: &[Self] = &[
        Self::UsE,
        Self::Eu,
        Self::Sea,
        Self::Brz,
        Self::Aus,
        Self::UsW,
        Self::Jpn,
        Self::Sa,
        Self::Me,
    ];

    /// Lowercase code used in URLs, file names and CSV rows (e.g. `us-e`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UsE => "us-e",
            Self::Eu => "eu",
            Self::Sea => "sea",
            Self::Brz => "brz",
            Self::Aus => "aus",
            Self::UsW => "us-w",
            Self::Jpn => "jpn",
            Self::Sa => "sa",
            Self::Me => "me",
        }
    }

    /// Human-readable region name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UsE => "US East",
            Self::Eu => "Europe",
            Self::Sea => "Southeast Asia",
            Self::Brz => "Brazil",
            Self::Aus => "Australia",
            Self::UsW => "US West",
            Self::Jpn => "Japan",
            Self::Sa => "South Africa",
            Self::Me => "Middle East",
        }
    }
}

/// Which rating an output file tracks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Metric {
    /// Highest rating reached this season.
    Peak,
    /// Current season rating.
    Season,
}

impl Metric {
    /// Both metrics, in the order their files are written.
    pub const ALL: &[Self] = &[Self::Peak, Self::Season];

    /// File name prefix for this metric's CSVs (`peak_ratings`, ...).
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Peak => "peak_ratings",
            Self::Season => "season_ratings",
        }
    }
}

/// One decoded leaderboard row, carrying both ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position on the leaderboard.
    pub rank: u32,
    /// Player name or numeric id.
    pub player: String,
    /// Region the entry was fetched for.
    pub region: Region,
    /// Highest rating reached this season.
    pub peak_rating: i64,
    /// Current season rating.
    pub season_rating: i64,
}

impl LeaderboardEntry {
    /// Returns the rating tracked by `metric`.
    #[must_use]
    pub const fn rating(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Peak => self.peak_rating,
            Metric::Season => self.season_rating,
        }
    }

    /// Projects this entry onto a single-metric CSV row.
    #[must_use]
    pub fn record(&self, metric: Metric) -> RatingRecord {
        RatingRecord {
            rank: self.rank,
            player: self.player.clone(),
            rating: self.rating(metric),
            region: self.region,
        }
    }
}

/// A single CSV row: `rank,player,rating,region`.
///
/// The `(player, region)` pair is the row identity; no output file holds
/// two rows with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// 1-based position on the leaderboard at fetch time.
    pub rank: u32,
    /// Player name or numeric id.
    pub player: String,
    /// Rating value for the file's metric.
    pub rating: i64,
    /// Region the row belongs to.
    pub region: Region,
}

impl RatingRecord {
    /// Row identity used for duplicate suppression.
    #[must_use]
    pub fn key(&self) -> (String, Region) {
        (self.player.clone(), self.region)
    }
}

/// A page that could not be fetched and is waiting to be retried.
///
/// Serialized as one `region,page` line in the failure log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FailureEntry {
    /// Region the page belongs to.
    pub region: Region,
    /// Page that failed.
    pub page: PageIndex,
}

impl FailureEntry {
    #[must_use]
    pub const fn new(region: Region, page: PageIndex) -> Self {
        Self { region, page }
    }
}

impl fmt::Display for FailureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.region.code(), self.page)
    }
}

/// Error returned when a `region,page` line cannot be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseEntryError {
    /// The line has no `,` separator.
    #[error("expected 'region,page', got '{0}'")]
    MissingSeparator(String),
    /// The region code is not one of [`Region::ALL`].
    #[error("unknown region '{0}'")]
    UnknownRegion(String),
    /// The page is not a positive integer.
    #[error("invalid page number '{0}'")]
    InvalidPage(String),
}

impl FromStr for FailureEntry {
    type Err = ParseEntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (region, page) = parse_region_page(s)?;
        Ok(Self { region, page })
    }
}

/// Parses a `region,page` pair, trimming whitespace around both halves.
///
/// Shared by the failure log and the checkpoint file, which use the same
/// line format.
///
/// # Errors
///
/// Returns [`ParseEntryError`] if the separator is missing, the region is
/// unknown, or the page is not a positive integer.
pub fn parse_region_page(s: &str) -> Result<(Region, PageIndex), ParseEntryError> {
    let trimmed = s.trim();
    let (region, page) = trimmed
        .split_once(',')
        .ok_or_else(|| ParseEntryError::MissingSeparator(trimmed.to_string()))?;

    let region = region.trim();
    let region = Region::from_str(region)
        .map_err(|_| ParseEntryError::UnknownRegion(region.to_string()))?;

    let page = page.trim();
    let page = page
        .parse::<PageIndex>()
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| ParseEntryError::InvalidPage(page.to_string()))?;

    Ok((region, page))
}
