//! Subcommand implementations, shared by the clap entry point and the
//! interactive menu.

use std::path::{Path, PathBuf};

use bh_ladder_analysis::distribution::RatingDistribution;
use bh_ladder_analysis::sort::{SortOrder, sort_path};
use bh_ladder_analysis::tables::{bracket_table, render_tables, tier_table};
use bh_ladder_cli_utils::{IndicatifProgress, MultiProgress};
use bh_ladder_ingest::config::ScrapeConfig;
use bh_ladder_ingest::global::{AggregateSummary, retry_global as retry_all, scrape_global};
use bh_ladder_ingest::retry::{RetrySummary, retry_region};
use bh_ladder_ingest::scrape::{ScrapeSummary, scrape_region};
use bh_ladder_ingest::{IngestError, RunState};
use bh_ladder_models::Region;
use bh_ladder_scraper::leaderboard::LeaderboardClient;
use bh_ladder_store::paths::{self, RunMode};

use crate::GlobalArgs;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Resolved configuration plus the data folder a run works in.
pub struct Context {
    pub config: ScrapeConfig,
    pub data_dir: PathBuf,
}

impl Context {
    /// Resolves defaults, `--config` and flags, and picks the data folder:
    /// `--data-dir` if given, otherwise today's folder under the output
    /// directory.
    pub fn resolve(args: &GlobalArgs) -> Result<Self, IngestError> {
        let config = ScrapeConfig::resolve(args.config.as_deref(), args.overrides())?;
        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| paths::today_dir(&config.output_directory));

        Ok(Self { config, data_dir })
    }

    fn client(&self) -> Result<LeaderboardClient, IngestError> {
        Ok(LeaderboardClient::new(&self.config.fetch_settings())?)
    }
}

pub async fn scrape(ctx: &Context, region: Region, multi: &MultiProgress) -> CliResult {
    let client = ctx.client()?;
    let mut state = RunState::open(&ctx.data_dir, RunMode::Regional)?;
    log::info!(
        "Scraping {} into {}",
        region.name(),
        ctx.data_dir.display()
    );

    let progress = IndicatifProgress::pages_bar(multi, &format!("Scraping {}", region.name()));
    let summary = scrape_region(
        &client,
        &mut state,
        region,
        &ctx.config.loop_settings(),
        progress.as_ref(),
    )
    .await?;
    progress.finish(format!("{} done", region.name()));

    print_scrape_summary(&summary);
    if !summary.failed_pages.is_empty() {
        println!("Run `bh_ladder retry --region {region}` to fetch the failed pages again.");
    }
    Ok(())
}

pub async fn retry(ctx: &Context, region: Region, multi: &MultiProgress) -> CliResult {
    let client = ctx.client()?;
    let mut state = RunState::open(&ctx.data_dir, RunMode::Regional)?;

    let progress = IndicatifProgress::retry_bar(multi, &format!("Retrying {}", region.name()));
    let summary = retry_region(
        &client,
        &mut state,
        region,
        &ctx.config.loop_settings(),
        progress.as_ref(),
    )
    .await?;
    progress.finish(format!("{} retry done", region.name()));

    print_retry_summary(&summary);
    Ok(())
}

pub async fn global(ctx: &Context, multi: &MultiProgress) -> CliResult {
    let client = ctx.client()?;
    let mut state = RunState::open(&ctx.data_dir, RunMode::Global)?;
    log::info!(
        "Scraping {} regions into {}",
        Region::ALL.len(),
        ctx.data_dir.display()
    );

    let progress = IndicatifProgress::pages_bar(multi, "Global scrape");
    let summary = scrape_global(
        &client,
        &mut state,
        Region::ALL,
        &ctx.config.loop_settings(),
        progress.as_ref(),
    )
    .await?;

    for region in &summary.regions {
        print_scrape_summary(region);
    }
    print_aggregate(&summary.aggregate);
    if summary.regions.iter().any(|r| !r.failed_pages.is_empty()) {
        println!("Run `bh_ladder retry-global` to fetch the failed pages again.");
    }
    Ok(())
}

pub async fn retry_global(ctx: &Context, multi: &MultiProgress) -> CliResult {
    let client = ctx.client()?;
    let mut state = RunState::open(&ctx.data_dir, RunMode::Global)?;

    let progress = IndicatifProgress::retry_bar(multi, "Retrying global failures");
    let summary = retry_all(
        &client,
        &mut state,
        &ctx.config.loop_settings(),
        progress.as_ref(),
    )
    .await?;

    if summary.regions.is_empty() {
        println!("No failed pages listed.");
    }
    for region in &summary.regions {
        print_retry_summary(region);
    }
    print_aggregate(&summary.aggregate);
    Ok(())
}

pub fn list_regions() {
    println!("{:<6} NAME", "CODE");
    println!("{}", "-".repeat(30));
    for region in Region::ALL {
        println!("{:<6} {}", region.code(), region.name());
    }
}

pub fn percentile(csv: &Path, ratings: &[f64], ascending: bool) -> CliResult {
    let dist = RatingDistribution::from_csv(csv)?;
    let direction = if ascending { "above (better)" } else { "below" };

    for &rating in ratings {
        let pct = dist.percentile(rating, ascending);
        println!("{pct:5.1}% of players are {direction} {rating}");
    }
    Ok(())
}

pub fn tiers(csv: &Path, json: bool) -> CliResult {
    let dist = RatingDistribution::from_csv(csv)?;
    let tiers = tier_table(&dist);
    let brackets = bracket_table(&dist);

    if json {
        let doc = serde_json::json!({
            "players": dist.len(),
            "tiers": tiers,
            "brackets": brackets,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{} players in {}", dist.len(), csv.display());
        println!();
        print!("{}", render_tables(&tiers, &brackets));
    }
    Ok(())
}

pub fn sort(path: &Path, order: SortOrder, in_place: bool) -> CliResult {
    let written = sort_path(path, order, in_place)?;
    println!("Sorted {} file(s)", written.len());
    for file in written {
        println!("  {}", file.display());
    }
    Ok(())
}

fn print_scrape_summary(summary: &ScrapeSummary) {
    let last = summary
        .last_committed
        .map_or_else(|| "none".to_string(), |p| p.to_string());
    println!(
        "{}: fetched {} page(s) from page {}, committed {}, {} new rows, last committed page {last}",
        summary.region,
        summary.pages_fetched,
        summary.start_page,
        summary.pages_committed,
        summary.rows_written,
    );
    if !summary.failed_pages.is_empty() {
        println!(
            "{}: {} page(s) failed: {:?}",
            summary.region,
            summary.failed_pages.len(),
            summary.failed_pages
        );
    }
}

fn print_retry_summary(summary: &RetrySummary) {
    println!(
        "{}: {} page(s) recovered ({} new rows), {} still failed",
        summary.region,
        summary.recovered.len(),
        summary.rows_written,
        summary.still_failed.len()
    );
    if !summary.still_failed.is_empty() {
        println!("{}: still failing: {:?}", summary.region, summary.still_failed);
    }
}

fn print_aggregate(aggregate: &AggregateSummary) {
    println!(
        "Global files: {} peak rows, {} season rows",
        aggregate.peak_rows, aggregate.season_rows
    );
}
