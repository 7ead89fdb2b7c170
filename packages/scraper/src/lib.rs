#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Leaderboard page fetching.
//!
//! Provides the [`PageFetcher`] trait, the reqwest-backed
//! [`LeaderboardClient`](leaderboard::LeaderboardClient), and the decoder
//! for the leaderboard's `__data.json` payloads ([`payload`]).
//!
//! A fetcher performs exactly one request per call and never retries on
//! its own. Callers decide what a [`FetchFailure`] means: the scrape loop
//! defers the page to the failure log, the retry loop tries again.

pub mod leaderboard;
pub mod payload;
pub mod progress;

use std::time::Duration;

use bh_ladder_models::{LeaderboardEntry, PageIndex, Region};

/// Default leaderboard endpoint. `{region}` and `{page}` are substituted
/// per request.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://www.brawlhalla.com/rankings/game/{region}/1v1/{page}/__data.json?sortBy=rank";

/// Default `User-Agent` header sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 bh-scraper";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// Errors that can occur while setting up a fetcher.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Building the HTTP client failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The URL template is unusable.
    #[error("Invalid URL template '{template}': {message}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Why a single page fetch did not produce entries.
///
/// Every variant is recoverable: the page can be fetched again later.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with something other than `200 OK`.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The request failed below the HTTP layer (DNS, connect, reset, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The body could not be read or is not valid JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Outcome of fetching one page.
///
/// `Ok(vec![])` means the page was retrieved and holds no entries, which is
/// how the leaderboard signals that the last rank has been passed.
pub type FetchResult = Result<Vec<LeaderboardEntry>, FetchFailure>;

/// Request settings shared by every page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Endpoint template containing `{page}` and optionally `{region}`.
    pub url_template: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Fetches a single leaderboard page.
///
/// Implementations issue one request per call. The scrape and retry loops
/// are generic over this trait so they can run against scripted fetchers
/// in tests.
pub trait PageFetcher: Send + Sync {
    /// Fetches and decodes `page` of the `region` leaderboard.
    fn fetch_page(
        &self,
        region: Region,
        page: PageIndex,
    ) -> impl std::future::Future<Output = FetchResult> + Send;
}
