//! Sorted rating samples and percentile lookups.

use std::path::Path;

use bh_ladder_store::csv_writer::read_records;

use crate::AnalysisError;

/// Ratings of one CSV, sorted ascending. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingDistribution {
    ratings: Vec<i64>,
}

impl RatingDistribution {
    /// Loads the `rating` column of a ratings CSV.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Store`] if the file cannot be read, or
    /// [`AnalysisError::Empty`] if it is missing or has no rows.
    pub fn from_csv(path: &Path) -> Result<Self, AnalysisError> {
        let ratings = read_records(path)?.into_iter().map(|r| r.rating);
        Self::from_ratings(ratings).ok_or_else(|| AnalysisError::Empty {
            path: path.to_path_buf(),
        })
    }

    /// Builds a distribution from raw ratings. Returns `None` if there are
    /// none.
    #[must_use]
    pub fn from_ratings(ratings: impl IntoIterator<Item = i64>) -> Option<Self> {
        let mut ratings: Vec<i64> = ratings.into_iter().collect();
        if ratings.is_empty() {
            return None;
        }
        ratings.sort_unstable();
        Some(Self { ratings })
    }

    /// Number of ratings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    /// Always `false`; kept for the `len` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Lowest rating.
    #[must_use]
    pub fn min(&self) -> i64 {
        self.ratings.first().copied().unwrap_or_default()
    }

    /// Highest rating.
    #[must_use]
    pub fn max(&self) -> i64 {
        self.ratings.last().copied().unwrap_or_default()
    }

    /// Percentage of ratings strictly below `value`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pct_below(&self, value: f64) -> f64 {
        let below = self.ratings.partition_point(|&r| (r as f64) < value);
        100.0 * below as f64 / self.ratings.len() as f64
    }

    /// Percentile of `value`: the share of players below it, or with
    /// `ascending` (lower is better) the share at or above it.
    #[must_use]
    pub fn percentile(&self, value: f64, ascending: bool) -> f64 {
        let below = self.pct_below(value);
        if ascending { 100.0 - below } else { below }
    }

    /// Minimum rating needed to be within the top `top_pct` percent.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn rating_for_top(&self, top_pct: f64) -> i64 {
        let n = self.ratings.len();
        let quantile = 1.0 - top_pct / 100.0;
        let index = ((quantile * n as f64).ceil() - 1.0).max(0.0) as usize;
        self.ratings[index.min(n - 1)]
    }
}
