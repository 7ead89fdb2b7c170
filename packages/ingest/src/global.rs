//! Multi-region driver and the combined `*_global.csv` output.

use bh_ladder_models::{Metric, Region};
use bh_ladder_scraper::PageFetcher;
use bh_ladder_scraper::progress::ProgressCallback;
use bh_ladder_store::csv_writer::{read_records, write_all};
use bh_ladder_store::paths::OutputScope;

use crate::config::LoopSettings;
use crate::retry::{RetrySummary, retry_region};
use crate::scrape::{ScrapeSummary, scrape_region};
use crate::{IngestError, RunState};

/// Row counts written to the global files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    pub peak_rows: usize,
    pub season_rows: usize,
}

/// Result of a global scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSummary {
    pub regions: Vec<ScrapeSummary>,
    pub aggregate: AggregateSummary,
}

/// Result of a global retry pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRetrySummary {
    pub regions: Vec<RetrySummary>,
    pub aggregate: AggregateSummary,
}

/// Scrapes each of `regions` in order, one after another, then rebuilds
/// the global files.
///
/// # Errors
///
/// Stops at the first region whose scrape hits an [`IngestError`], or if
/// aggregation fails.
pub async fn scrape_global<F: PageFetcher>(
    fetcher: &F,
    state: &mut RunState,
    regions: &[Region],
    settings: &LoopSettings,
    progress: &dyn ProgressCallback,
) -> Result<GlobalSummary, IngestError> {
    let mut summaries = Vec::with_capacity(regions.len());

    for &region in regions {
        log::info!("Global scrape: {} ({region})", region.name());
        summaries.push(scrape_region(fetcher, state, region, settings, progress).await?);
    }

    let aggregate = aggregate_global(state)?;
    progress.finish(format!("Global: {} regions scraped", summaries.len()));

    Ok(GlobalSummary {
        regions: summaries,
        aggregate,
    })
}

/// Retries every region with listed failures, then rebuilds the global
/// files.
///
/// # Errors
///
/// Returns [`IngestError`] if the failure log or a CSV cannot be read or
/// written.
pub async fn retry_global<F: PageFetcher>(
    fetcher: &F,
    state: &mut RunState,
    settings: &LoopSettings,
    progress: &dyn ProgressCallback,
) -> Result<GlobalRetrySummary, IngestError> {
    let regions = state.failures.regions()?;
    let mut summaries = Vec::with_capacity(regions.len());

    for region in regions {
        summaries.push(retry_region(fetcher, state, region, settings, progress).await?);
    }

    let aggregate = aggregate_global(state)?;
    progress.finish(format!("Global: {} regions retried", summaries.len()));

    Ok(GlobalRetrySummary {
        regions: summaries,
        aggregate,
    })
}

/// Rewrites `peak_ratings_global.csv` and `season_ratings_global.csv` as
/// the concatenation of every region's file, in [`Region::ALL`] order.
///
/// Each row keeps the region of the file it came from. Regions without a
/// file contribute nothing. The global files are replaced wholesale, so
/// running this twice yields the same output.
///
/// # Errors
///
/// Returns [`IngestError::Store`] if a regional file cannot be read or a
/// global file cannot be written.
pub fn aggregate_global(state: &mut RunState) -> Result<AggregateSummary, IngestError> {
    let mut summary = AggregateSummary::default();

    for &metric in Metric::ALL {
        let mut combined = Vec::new();
        for &region in Region::ALL {
            let path = state.csv.path_for(OutputScope::Region(region), metric);
            let mut records = read_records(&path)?;
            for record in &mut records {
                record.region = region;
            }
            combined.extend(records);
        }

        let target = state.csv.path_for(OutputScope::Global, metric);
        write_all(&target, &combined)?;
        log::info!("Wrote {} rows to {}", combined.len(), target.display());

        match metric {
            Metric::Peak => summary.peak_rows = combined.len(),
            Metric::Season => summary.season_rows = combined.len(),
        }
    }

    state.csv.invalidate();

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use bh_ladder_scraper::progress::NullProgress;
    use bh_ladder_store::paths::RunMode;

    use super::*;
    use crate::testing::{ScriptedFetcher, fast_settings, timeout};

    fn open(dir: &tempfile::TempDir) -> RunState {
        RunState::open(dir.path(), RunMode::Global).unwrap()
    }

    fn global_rows(state: &RunState, metric: Metric) -> Vec<(String, Region)> {
        read_records(&state.csv.path_for(OutputScope::Global, metric))
            .unwrap()
            .into_iter()
            .map(|r| (r.player, r.region))
            .collect()
    }

    #[tokio::test]
    async fn aggregate_holds_every_regional_row_tagged_by_region() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_pages(Region::Eu, 2, 3)
            .with_pages(Region::Sea, 1, 4);

        let summary = scrape_global(
            &fetcher,
            &mut state,
            &[Region::Eu, Region::Sea],
            &fast_settings(),
            &NullProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.regions.len(), 2);
        assert_eq!(summary.aggregate.peak_rows, 6 + 4);
        assert_eq!(summary.aggregate.season_rows, 6 + 4);

        let rows = global_rows(&state, Metric::Peak);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows.iter().filter(|(_, r)| *r == Region::Eu).count(), 6);
        assert_eq!(rows.iter().filter(|(_, r)| *r == Region::Sea).count(), 4);
        assert!(rows.iter().all(|(player, region)| player.starts_with(region.code())));
    }

    #[tokio::test]
    async fn global_run_uses_global_state_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_pages(Region::Jpn, 2, 1)
            .with_page(Region::Jpn, 3, timeout());

        scrape_global(&fetcher, &mut state, &[Region::Jpn], &fast_settings(), &NullProgress)
            .await
            .unwrap();

        assert!(dir.path().join("last_page_global.txt").exists());
        assert!(dir.path().join("failed_pages_global.txt").exists());
        assert!(!dir.path().join("last_page.txt").exists());
        assert_eq!(state.checkpoints.load(Region::Jpn).unwrap(), Some(2));
    }

    #[test]
    fn aggregating_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open(&dir);
        std::fs::write(
            state.csv.path_for(OutputScope::Region(Region::UsE), Metric::Peak),
            "rank,player,rating,region\n1,a,2400,us-e\n2,b,2300,us-e\n",
        )
        .unwrap();
        std::fs::write(
            state.csv.path_for(OutputScope::Region(Region::Aus), Metric::Peak),
            "rank,player,rating,region\n1,c,2200,aus\n",
        )
        .unwrap();

        let first = aggregate_global(&mut state).unwrap();
        let contents =
            std::fs::read_to_string(state.csv.path_for(OutputScope::Global, Metric::Peak)).unwrap();
        let second = aggregate_global(&mut state).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.peak_rows, 3);
        assert_eq!(first.season_rows, 0);
        assert_eq!(
            std::fs::read_to_string(state.csv.path_for(OutputScope::Global, Metric::Peak)).unwrap(),
            contents
        );
        assert_eq!(
            contents,
            "rank,player,rating,region\n1,a,2400,us-e\n2,b,2300,us-e\n1,c,2200,aus\n"
        );
    }

    #[tokio::test]
    async fn retry_global_recovers_and_reaggregates() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = open(&dir);
        state.failures.record(Region::Sa, 2).unwrap();
        state.failures.record(Region::Me, 5).unwrap();
        let fetcher = ScriptedFetcher::new()
            .with_pages(Region::Sa, 2, 2)
            .with_page(Region::Me, 5, timeout());

        let summary = retry_global(&fetcher, &mut state, &fast_settings(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(summary.regions.len(), 2);
        assert_eq!(state.failures.regions().unwrap(), vec![Region::Me]);
        assert_eq!(summary.aggregate.peak_rows, 2);
        assert!(
            global_rows(&state, Metric::Season)
                .iter()
                .all(|(_, region)| *region == Region::Sa)
        );
    }
}
