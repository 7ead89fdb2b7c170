//! Per-region scrape loop.
//!
//! Walks one region's leaderboard page by page, starting after the last
//! checkpointed page. Each non-empty page is appended to both ratings CSVs
//! and then checkpointed before the next request goes out, so an
//! interrupted run resumes exactly where it left off.

use bh_ladder_models::{PageIndex, Region};
use bh_ladder_scraper::PageFetcher;
use bh_ladder_scraper::progress::ProgressCallback;
use bh_ladder_store::paths::OutputScope;

use crate::config::LoopSettings;
use crate::{IngestError, RunState};

/// Phases of a region scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    /// Reading the checkpoint to pick the first page.
    Resuming,
    /// Requesting pages.
    Fetching,
    /// A stop condition was hit.
    Stopping,
    /// The loop has finished.
    Done,
}

/// What a region scrape did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub region: Region,
    /// First page requested by this run.
    pub start_page: PageIndex,
    /// Checkpoint at the end of the run.
    pub last_committed: Option<PageIndex>,
    pub pages_fetched: u32,
    pub pages_committed: u32,
    pub empty_pages: u32,
    /// Pages deferred to the failure log by this run.
    pub failed_pages: Vec<PageIndex>,
    /// Rows appended to the peak ratings CSV.
    pub rows_written: usize,
}

impl ScrapeSummary {
    const fn new(region: Region) -> Self {
        Self {
            region,
            start_page: 1,
            last_committed: None,
            pages_fetched: 0,
            pages_committed: 0,
            empty_pages: 0,
            failed_pages: Vec::new(),
            rows_written: 0,
        }
    }
}

/// Scrapes `region` from its checkpoint until the leaderboard runs dry.
///
/// The loop stops after `stop_after_empty_pages` consecutive pages that
/// yielded no rows, or once the cursor passes `max_page`. A page that
/// fails to fetch is recorded in the failure log and skipped; it also
/// counts toward the consecutive threshold so an outage ends the run
/// instead of walking pages forever.
///
/// # Errors
///
/// Returns [`IngestError`] if the checkpoint cannot be read, a page cannot
/// be committed, or a failure cannot be logged. Fetch failures are never
/// returned.
#[allow(clippy::too_many_lines)]
pub async fn scrape_region<F: PageFetcher>(
    fetcher: &F,
    state: &mut RunState,
    region: Region,
    settings: &LoopSettings,
    progress: &dyn ProgressCallback,
) -> Result<ScrapeSummary, IngestError> {
    let mut summary = ScrapeSummary::new(region);
    let mut phase = ScrapeState::Resuming;
    let mut cursor: PageIndex = 1;
    let mut dry_streak = 0u32;

    loop {
        phase = match phase {
            ScrapeState::Resuming => {
                let last = state
                    .checkpoints
                    .load(region)
                    .map_err(|source| IngestError::Checkpoint { region, source })?;
                summary.last_committed = last;

                cursor = last.map_or(1, |page| page.saturating_add(1));
                summary.start_page = cursor;

                match last {
                    Some(page) => log::info!("{region}: resuming after page {page}"),
                    None => log::info!("{region}: starting from page 1"),
                }
                ScrapeState::Fetching
            }
            ScrapeState::Fetching => {
                if settings.max_page.is_some_and(|max| cursor > max) {
                    log::info!("{region}: reached page cap at page {}", cursor - 1);
                    ScrapeState::Stopping
                } else {
                    if summary.pages_fetched > 0 && !settings.pause.is_zero() {
                        tokio::time::sleep(settings.pause).await;
                    }

                    progress.set_message(format!("{region} page {cursor}"));
                    let result = fetcher.fetch_page(region, cursor).await;
                    summary.pages_fetched += 1;
                    progress.inc(1);

                    match result {
                        Ok(entries) if !entries.is_empty() => {
                            let rows = state
                                .csv
                                .append_entries(OutputScope::Region(region), &entries)
                                .map_err(|source| IngestError::Commit {
                                    region,
                                    page: cursor,
                                    source,
                                })?;
                            state.checkpoints.save(region, cursor).map_err(|source| {
                                IngestError::Commit {
                                    region,
                                    page: cursor,
                                    source,
                                }
                            })?;

                            log::info!(
                                "{region}: page {cursor} committed ({} entries, {rows} new rows)",
                                entries.len()
                            );
                            summary.rows_written += rows;
                            summary.pages_committed += 1;
                            summary.last_committed = Some(cursor);
                            dry_streak = 0;
                        }
                        Ok(_) => {
                            dry_streak += 1;
                            summary.empty_pages += 1;
                            log::warn!(
                                "{region}: page {cursor} is empty ({dry_streak}/{})",
                                settings.stop_after_empty_pages
                            );
                        }
                        Err(failure) => {
                            state.failures.record(region, cursor).map_err(|source| {
                                IngestError::FailureLog {
                                    region,
                                    page: cursor,
                                    source,
                                }
                            })?;
                            dry_streak += 1;
                            summary.failed_pages.push(cursor);
                            log::warn!(
                                "{region}: page {cursor} failed ({failure}), deferred to retry"
                            );
                        }
                    }

                    cursor = cursor.saturating_add(1);

                    if dry_streak >= settings.stop_after_empty_pages {
                        log::info!(
                            "{region}: {dry_streak} consecutive pages without data, end of leaderboard"
                        );
                        ScrapeState::Stopping
                    } else {
                        ScrapeState::Fetching
                    }
                }
            }
            ScrapeState::Stopping => {
                progress.set_message(format!(
                    "{region}: {} pages committed, {} failed",
                    summary.pages_committed,
                    summary.failed_pages.len()
                ));
                ScrapeState::Done
            }
            ScrapeState::Done => break,
        };
    }

    Ok(summary)
}
