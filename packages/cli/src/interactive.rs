//! Menu-driven front end.
//!
//! Offers the same actions as the subcommands through `dialoguer` prompts,
//! using the configuration resolved from the command line as defaults.

use std::path::PathBuf;

use bh_ladder_analysis::sort::SortOrder;
use bh_ladder_cli_utils::MultiProgress;
use bh_ladder_models::Region;
use dialoguer::{Confirm, Input, Select};

use crate::commands::{self, Context};

/// Top-level actions in the menu.
enum Action {
    Scrape,
    Retry,
    Global,
    RetryGlobal,
    Percentile,
    Tiers,
    Sort,
    ListRegions,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Scrape,
        Self::Retry,
        Self::Global,
        Self::RetryGlobal,
        Self::Percentile,
        Self::Tiers,
        Self::Sort,
        Self::ListRegions,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Scrape => "Scrape a region",
            Self::Retry => "Retry failed pages of a region",
            Self::Global => "Scrape all regions (global)",
            Self::RetryGlobal => "Retry failed pages of a global run",
            Self::Percentile => "Look up rating percentiles",
            Self::Tiers => "Show tier and bracket tables",
            Self::Sort => "Sort ratings CSVs",
            Self::ListRegions => "List regions",
        }
    }
}

/// Prompts for an action and runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen action fails.
pub async fn run(ctx: &Context, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Brawlhalla 1v1 leaderboard scraper");
    println!("Data folder: {}", ctx.data_dir.display());
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Scrape => {
            let region = select_region(ctx.config.region)?;
            commands::scrape(ctx, region, multi).await?;
        }
        Action::Retry => {
            let region = select_region(ctx.config.region)?;
            commands::retry(ctx, region, multi).await?;
        }
        Action::Global => commands::global(ctx, multi).await?,
        Action::RetryGlobal => commands::retry_global(ctx, multi).await?,
        Action::Percentile => {
            let csv = prompt_csv(ctx, "Ratings CSV")?;
            let ratings = prompt_ratings()?;
            let ascending = Confirm::new()
                .with_prompt("Are lower ratings better?")
                .default(false)
                .interact()?;
            commands::percentile(&csv, &ratings, ascending)?;
        }
        Action::Tiers => {
            let csv = prompt_csv(ctx, "Ratings CSV")?;
            commands::tiers(&csv, false)?;
        }
        Action::Sort => {
            let path: String = Input::new()
                .with_prompt("CSV file or folder")
                .default(ctx.data_dir.display().to_string())
                .interact_text()?;
            let ascending = Confirm::new()
                .with_prompt("Lowest rating first?")
                .default(false)
                .interact()?;
            let in_place = Confirm::new()
                .with_prompt("Overwrite the original file(s)?")
                .default(false)
                .interact()?;
            let order = if ascending {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            commands::sort(&PathBuf::from(path), order, in_place)?;
        }
        Action::ListRegions => commands::list_regions(),
    }

    Ok(())
}

/// Prompts for a region, preselecting `default`.
fn select_region(default: Region) -> Result<Region, dialoguer::Error> {
    let labels: Vec<String> = Region::ALL
        .iter()
        .map(|r| format!("{:<5} {}", r.code(), r.name()))
        .collect();
    let default_idx = Region::ALL.iter().position(|&r| r == default).unwrap_or(0);

    let idx = Select::new()
        .with_prompt("Region")
        .items(&labels)
        .default(default_idx)
        .interact()?;

    Ok(Region::ALL[idx])
}

/// Prompts for a CSV path, suggesting the season file of the configured
/// region in the data folder.
fn prompt_csv(ctx: &Context, prompt: &str) -> Result<PathBuf, dialoguer::Error> {
    let suggestion = ctx
        .data_dir
        .join(format!("season_ratings_{}.csv", ctx.config.region.code()));

    let path: String = Input::new()
        .with_prompt(prompt)
        .default(suggestion.display().to_string())
        .interact_text()?;

    Ok(PathBuf::from(path))
}

/// Prompts for whitespace- or comma-separated ratings until at least one
/// parses.
fn prompt_ratings() -> Result<Vec<f64>, dialoguer::Error> {
    loop {
        let raw: String = Input::new()
            .with_prompt("Ratings (e.g. 1500 1800)")
            .interact_text()?;

        let parsed: Result<Vec<f64>, _> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse::<f64>)
            .collect();

        match parsed {
            Ok(ratings) if !ratings.is_empty() => return Ok(ratings),
            _ => println!("Enter one or more numbers."),
        }
    }
}
