//! Scripted [`PageFetcher`] for exercising the loops without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use bh_ladder_models::{LeaderboardEntry, PageIndex, Region};
use bh_ladder_scraper::{FetchFailure, FetchResult, PageFetcher};

use crate::config::LoopSettings;

type Key = (Region, PageIndex);

/// Answers each request from a script.
///
/// A page with queued results pops one per call; once the queue is
/// drained (or if none was queued) the steady result is returned, and
/// pages with no script at all answer `Ok(vec![])`.
#[derive(Default)]
pub struct ScriptedFetcher {
    steady: HashMap<Key, FetchResult>,
    queued: Mutex<HashMap<Key, VecDeque<FetchResult>>>,
    calls: Mutex<Vec<Key>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages `1..=pages` of `region` each return `per_page` entries.
    pub fn with_pages(mut self, region: Region, pages: PageIndex, per_page: u32) -> Self {
        for page in 1..=pages {
            self.steady
                .insert((region, page), Ok(page_entries(region, page, per_page)));
        }
        self
    }

    /// `page` of `region` always returns `result`.
    pub fn with_page(mut self, region: Region, page: PageIndex, result: FetchResult) -> Self {
        self.steady.insert((region, page), result);
        self
    }

    /// `page` of `region` returns `results` in order, then falls back to
    /// its steady result.
    pub fn with_sequence(
        self,
        region: Region,
        page: PageIndex,
        results: impl IntoIterator<Item = FetchResult>,
    ) -> Self {
        self.queued
            .lock()
            .unwrap()
            .insert((region, page), results.into_iter().collect());
        self
    }

    /// Every request made so far, in order.
    pub fn calls(&self) -> Vec<Key> {
        self.calls.lock().unwrap().clone()
    }

    /// Pages requested for `region`, in order.
    pub fn pages_for(&self, region: Region) -> Vec<PageIndex> {
        self.calls()
            .into_iter()
            .filter(|(r, _)| *r == region)
            .map(|(_, page)| page)
            .collect()
    }

    fn answer(&self, region: Region, page: PageIndex) -> FetchResult {
        self.calls.lock().unwrap().push((region, page));

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&(region, page))
            .and_then(VecDeque::pop_front);

        queued.unwrap_or_else(|| {
            self.steady
                .get(&(region, page))
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        })
    }
}

impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, region: Region, page: PageIndex) -> FetchResult {
        self.answer(region, page)
    }
}

/// `count` distinct entries for `page` of `region`, ranked continuously
/// across pages.
pub fn page_entries(region: Region, page: PageIndex, count: u32) -> Vec<LeaderboardEntry> {
    (0..count)
        .map(|i| {
            let rank = (page - 1) * count + i + 1;
            LeaderboardEntry {
                rank,
                player: format!("{}-player-{rank}", region.code()),
                region,
                peak_rating: 3000 - i64::from(rank),
                season_rating: 2500 - i64::from(rank),
            }
        })
        .collect()
}

pub fn timeout() -> FetchResult {
    Err(FetchFailure::Timeout)
}

pub fn unavailable() -> FetchResult {
    Err(FetchFailure::HttpStatus(503))
}

/// Default thresholds with every pause set to zero.
pub fn fast_settings() -> LoopSettings {
    LoopSettings {
        pause: Duration::ZERO,
        retry_pause: Duration::ZERO,
        ..LoopSettings::default()
    }
}
