#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Brawlhalla 1v1 leaderboard scraper.
//!
//! Without a subcommand it scrapes `--region` (default `sea`) into today's
//! `Data-<DDMon>` folder, resuming from the folder's checkpoint.
//!
//! Uses `indicatif-log-bridge` (via [`bh_ladder_cli_utils::init_logger`])
//! so log lines and progress bars share the terminal cleanly.

mod commands;
mod interactive;

use std::path::PathBuf;
use std::process::ExitCode;

use bh_ladder_analysis::sort::SortOrder;
use bh_ladder_ingest::config::ConfigOverrides;
use bh_ladder_models::{PageIndex, Region};
use clap::{Args, Parser, Subcommand};

use crate::commands::Context;

#[derive(Parser)]
#[command(name = "bh_ladder", about = "Brawlhalla 1v1 leaderboard scraper")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings shared by every scrape-related subcommand.
#[derive(Args, Debug, Clone, Default)]
struct GlobalArgs {
    /// Region code (us-e, eu, sea, brz, aus, us-w, jpn, sa, me)
    #[arg(long, global = true)]
    region: Option<Region>,
    /// Root under which the dated `Data-<DDMon>` folder is created
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// Exact data folder to use instead of today's (e.g. to retry an
    /// earlier run)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<f64>,
    /// Pause between page requests in seconds
    #[arg(long, global = true)]
    pause: Option<f64>,
    /// Stop after this many consecutive pages without data
    #[arg(long, global = true)]
    stop_after: Option<u32>,
    /// Do not fetch pages past this one
    #[arg(long, global = true)]
    max_page: Option<PageIndex>,
}

impl GlobalArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            region: self.region,
            timeout_seconds: self.timeout,
            pause_seconds: self.pause,
            stop_after_empty_pages: self.stop_after,
            max_page: self.max_page,
            output_directory: self.out_dir.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one region, resuming from its checkpoint
    Scrape,
    /// Retry the failed pages of one region
    Retry,
    /// Scrape every region, then write the combined global CSVs
    Global,
    /// Retry failed pages of a global run, then rewrite the global CSVs
    RetryGlobal,
    /// List known region codes
    Regions,
    /// Report the percentile of one or more ratings in a ratings CSV
    Percentile {
        /// Ratings CSV (e.g. `Data-22Jun/season_ratings_sea.csv`)
        csv: PathBuf,
        /// Ratings to look up
        #[arg(required = true, num_args = 1..)]
        ratings: Vec<f64>,
        /// Treat lower ratings as better
        #[arg(long)]
        ascending: bool,
    },
    /// Print the tier and top-bracket tables of a ratings CSV
    Tiers {
        /// Ratings CSV
        csv: PathBuf,
        /// Print JSON instead of text tables
        #[arg(long)]
        json: bool,
    },
    /// Sort a ratings CSV, or every CSV in a folder, by rating
    Sort {
        /// CSV file or folder of CSVs
        path: PathBuf,
        /// Lowest rating first
        #[arg(long, alias = "ascending")]
        asc: bool,
        /// Overwrite the original file(s)
        #[arg(long)]
        inplace: bool,
    },
    /// Choose an action from a menu
    Interactive,
}

#[tokio::main]
async fn main() -> ExitCode {
    let multi = bh_ladder_cli_utils::init_logger();
    let cli = Cli::parse();

    match run(cli, &multi).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    cli: Cli,
    multi: &bh_ladder_cli_utils::MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.command.unwrap_or(Commands::Scrape);

    match command {
        Commands::Regions => commands::list_regions(),
        Commands::Percentile {
            csv,
            ratings,
            ascending,
        } => commands::percentile(&csv, &ratings, ascending)?,
        Commands::Tiers { csv, json } => commands::tiers(&csv, json)?,
        Commands::Sort { path, asc, inplace } => {
            let order = if asc {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            commands::sort(&path, order, inplace)?;
        }
        Commands::Scrape => {
            let ctx = Context::resolve(&cli.global)?;
            commands::scrape(&ctx, ctx.config.region, multi).await?;
        }
        Commands::Retry => {
            let ctx = Context::resolve(&cli.global)?;
            commands::retry(&ctx, ctx.config.region, multi).await?;
        }
        Commands::Global => {
            let ctx = Context::resolve(&cli.global)?;
            commands::global(&ctx, multi).await?;
        }
        Commands::RetryGlobal => {
            let ctx = Context::resolve(&cli.global)?;
            commands::retry_global(&ctx, multi).await?;
        }
        Commands::Interactive => {
            let ctx = Context::resolve(&cli.global)?;
            interactive::run(&ctx, multi).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_scrape() {
        let cli = Cli::try_parse_from(["bh_ladder"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.global.region, None);
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bh_ladder",
            "retry",
            "--region",
            "US-E",
            "--data-dir",
            "Data-21Jun",
            "--max-page",
            "40",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Commands::Retry)));
        assert_eq!(cli.global.region, Some(Region::UsE));
        assert_eq!(cli.global.data_dir, Some(PathBuf::from("Data-21Jun")));

        let overrides = cli.global.overrides();
        assert_eq!(overrides.max_page, Some(40));
    }

    #[test]
    fn rejects_unknown_region() {
        assert!(Cli::try_parse_from(["bh_ladder", "--region", "mars"]).is_err());
    }

    #[test]
    fn percentile_needs_at_least_one_rating() {
        assert!(Cli::try_parse_from(["bh_ladder", "percentile", "x.csv"]).is_err());

        let cli =
            Cli::try_parse_from(["bh_ladder", "percentile", "x.csv", "1500", "1800.5"]).unwrap();
        let Some(Commands::Percentile { ratings, .. }) = cli.command else {
            panic!("expected percentile");
        };
        assert_eq!(ratings, vec![1500.0, 1800.5]);
    }
}
