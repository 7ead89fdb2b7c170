//! Retry loop for pages listed in the failure log.

use std::time::Duration;

use bh_ladder_models::{LeaderboardEntry, PageIndex, Region};
use bh_ladder_scraper::progress::ProgressCallback;
use bh_ladder_scraper::{FetchFailure, PageFetcher};
use bh_ladder_store::paths::OutputScope;

use crate::config::LoopSettings;
use crate::{IngestError, RunState};

/// What a retry pass over one region did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySummary {
    pub region: Region,
    /// Pages fetched successfully and removed from the log.
    pub recovered: Vec<PageIndex>,
    /// Pages that exhausted every attempt and stay listed.
    pub still_failed: Vec<PageIndex>,
    /// Rows appended to the peak ratings CSV.
    pub rows_written: usize,
}

/// Re-fetches every failed page of `region`, in ascending page order.
///
/// Each page gets up to `max_retry_attempts` requests with `retry_pause`
/// slept before every request but the first of the pass. A page that
/// comes back (even empty) has its rows appended and is removed from the
/// log. A page that keeps failing stays listed for a later pass.
///
/// # Errors
///
/// Returns [`IngestError`] if the log cannot be read or updated, or a
/// recovered page cannot be written.
pub async fn retry_region<F: PageFetcher>(
    fetcher: &F,
    state: &mut RunState,
    region: Region,
    settings: &LoopSettings,
    progress: &dyn ProgressCallback,
) -> Result<RetrySummary, IngestError> {
    let pages = state.failures.list(region)?;
    let mut summary = RetrySummary {
        region,
        recovered: Vec::new(),
        still_failed: Vec::new(),
        rows_written: 0,
    };

    if pages.is_empty() {
        log::info!("{region}: no failed pages to retry");
        return Ok(summary);
    }

    log::info!("{region}: retrying {} failed page(s)", pages.len());
    progress.set_total(pages.len() as u64);

    let mut first_request = true;
    for page in pages {
        progress.set_message(format!("{region} page {page}"));

        let outcome =
            fetch_with_retries(fetcher, region, page, settings, &mut first_request).await;

        match outcome {
            Ok(entries) => {
                let rows = state
                    .csv
                    .append_entries(OutputScope::Region(region), &entries)
                    .map_err(|source| IngestError::Commit {
                        region,
                        page,
                        source,
                    })?;
                state
                    .failures
                    .remove(region, page)
                    .map_err(|source| IngestError::FailureLog {
                        region,
                        page,
                        source,
                    })?;

                log::info!("{region}: recovered page {page} ({rows} new rows)");
                summary.rows_written += rows;
                summary.recovered.push(page);
            }
            Err(failure) => {
                log::warn!(
                    "{region}: page {page} still failing after {} attempt(s): {failure}",
                    settings.max_retry_attempts
                );
                summary.still_failed.push(page);
            }
        }

        progress.inc(1);
    }

    progress.set_message(format!(
        "{region}: {} recovered, {} still failed",
        summary.recovered.len(),
        summary.still_failed.len()
    ));

    Ok(summary)
}

async fn fetch_with_retries<F: PageFetcher>(
    fetcher: &F,
    region: Region,
    page: PageIndex,
    settings: &LoopSettings,
    first_request: &mut bool,
) -> Result<Vec<LeaderboardEntry>, FetchFailure> {
    let attempts = settings.max_retry_attempts.max(1);
    let mut last_failure = FetchFailure::Timeout;

    for attempt in 1..=attempts {
        if !*first_request {
            pause(settings.retry_pause).await;
        }
        *first_request = false;

        match fetcher.fetch_page(region, page).await {
            Ok(entries) => return Ok(entries),
            Err(failure) => {
                log::warn!("{region}: page {page} attempt {attempt}/{attempts} failed: {failure}");
                last_failure = failure;
            }
        }
    }

    Err(last_failure)
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use bh_ladder_models::Metric;
    use bh_ladder_scraper::progress::NullProgress;
    use bh_ladder_store::csv_writer::read_records;
    use bh_ladder_store::paths::RunMode;

    use super::*;
    use crate::testing::{ScriptedFetcher, fast_settings, page_entries, timeout, unavailable};

    fn open_with_failures(dir: &tempfile::TempDir, failed: &[(Region, PageIndex)]) -> RunState {
        let state = RunState::open(dir.path(), RunMode::Regional).unwrap();
        for (region, page) in failed {
            state.failures.record(*region, *page).unwrap();
        }
        state
    }

    fn peak_players(state: &RunState, region: Region) -> Vec<String> {
        read_records(&state.csv.path_for(OutputScope::Region(region), Metric::Peak))
            .unwrap()
            .into_iter()
            .map(|r| r.player)
            .collect()
    }

    #[tokio::test]
    async fn page_succeeding_on_third_attempt_is_recovered_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open_with_failures(&dir, &[(Region::Sea, 7)]);
        let fetcher = ScriptedFetcher::new().with_sequence(
            Region::Sea,
            7,
            [timeout(), unavailable(), Ok(page_entries(Region::Sea, 7, 3))],
        );

        let summary = retry_region(&fetcher, &mut state, Region::Sea, &fast_settings(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(fetcher.calls().len(), 3);
        assert_eq!(summary.recovered, vec![7]);
        assert!(summary.still_failed.is_empty());
        assert!(state.failures.list(Region::Sea).unwrap().is_empty());

        let expected: Vec<String> = page_entries(Region::Sea, 7, 3)
            .into_iter()
            .map(|e| e.player)
            .collect();
        assert_eq!(peak_players(&state, Region::Sea), expected);
    }

    #[tokio::test]
    async fn page_failing_every_attempt_stays_listed() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open_with_failures(&dir, &[(Region::Eu, 4)]);
        let fetcher = ScriptedFetcher::new().with_page(Region::Eu, 4, timeout());

        let summary = retry_region(&fetcher, &mut state, Region::Eu, &fast_settings(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(fetcher.calls().len(), 3);
        assert_eq!(summary.still_failed, vec![4]);
        assert_eq!(state.failures.list(Region::Eu).unwrap(), vec![4]);
        assert!(peak_players(&state, Region::Eu).is_empty());
    }

    #[tokio::test]
    async fn retries_pages_in_ascending_order_and_leaves_other_regions() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open_with_failures(
            &dir,
            &[(Region::Sea, 9), (Region::Eu, 1), (Region::Sea, 2), (Region::Sea, 9)],
        );
        let fetcher = ScriptedFetcher::new()
            .with_page(Region::Sea, 2, Ok(page_entries(Region::Sea, 2, 1)))
            .with_page(Region::Sea, 9, Ok(page_entries(Region::Sea, 9, 1)));

        let summary = retry_region(&fetcher, &mut state, Region::Sea, &fast_settings(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(fetcher.pages_for(Region::Sea), vec![2, 9]);
        assert_eq!(summary.recovered, vec![2, 9]);
        assert_eq!(summary.rows_written, 2);
        assert_eq!(state.failures.regions().unwrap(), vec![Region::Eu]);
    }

    #[tokio::test]
    async fn empty_page_counts_as_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open_with_failures(&dir, &[(Region::UsW, 40)]);
        let fetcher = ScriptedFetcher::new();

        let summary = retry_region(&fetcher, &mut state, Region::UsW, &fast_settings(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(fetcher.calls().len(), 1);
        assert_eq!(summary.recovered, vec![40]);
        assert_eq!(summary.rows_written, 0);
        assert!(state.failures.list(Region::UsW).unwrap().is_empty());
    }

    #[tokio::test]
    async fn nothing_to_retry_makes_no_requests() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open_with_failures(&dir, &[]);
        let fetcher = ScriptedFetcher::new();

        let summary = retry_region(&fetcher, &mut state, Region::Sea, &fast_settings(), &NullProgress)
            .await
            .unwrap();

        assert!(fetcher.calls().is_empty());
        assert!(summary.recovered.is_empty());
        assert!(summary.still_failed.is_empty());
    }
}
