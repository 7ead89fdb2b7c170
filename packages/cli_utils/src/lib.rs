#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `bh_ladder` binary.
//!
//! [`init_logger`] installs `pretty_env_logger` behind
//! `indicatif-log-bridge`, so log lines are printed above the progress bars
//! instead of tearing through them. [`IndicatifProgress`] adapts an
//! `indicatif` bar to the loops' [`ProgressCallback`].

use std::sync::Arc;
use std::time::Duration;

use bh_ladder_scraper::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Tick rate of the scrape and retry spinners.
const TICK: Duration = Duration::from_millis(120);

/// Progress display for one scrape or retry run.
///
/// A scrape never learns its last page, so its display stays a page
/// counter. A retry pass reports how many pages the failure log lists and
/// switches to `sized_style` at that point.
pub struct IndicatifProgress {
    bar: ProgressBar,
    sized_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Page counter for a region scrape: `⠋ Scraping Europe (42 pages, 1m)`.
    #[must_use]
    pub fn pages_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let counter = style("{spinner:.cyan} {msg} ({pos} pages, {elapsed})");
        let bar = ticking(multi, counter.clone(), message);

        Arc::new(Self {
            bar,
            sized_style: counter,
        })
    }

    /// Failed-page pass: a bare spinner while the failure log is read, then
    /// `attempted/listed` once the loop knows how many pages are listed.
    #[must_use]
    pub fn retry_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = ticking(multi, style("{spinner:.yellow} {msg}"), message);
        let sized_style = ProgressStyle::with_template(
            "  {msg} [{bar:30.yellow/dim}] {pos}/{len} failed pages [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        Arc::new(Self { bar, sized_style })
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn ticking(multi: &MultiProgress, style: ProgressStyle, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner().with_style(style));
    bar.enable_steady_tick(TICK);
    bar.set_message(message.to_string());
    bar
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.sized_style.clone());
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Routes `log` output through `indicatif-log-bridge` so page logs from the
/// scrape loop print above the live bars.
///
/// The filter comes from `RUST_LOG`, defaulting to `info` when unset.
/// Every bar of the run must be added to the returned [`MultiProgress`].
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filter) => builder.parse_filters(&filter),
        Err(_) => builder.filter_level(log::LevelFilter::Info),
    };
    let logger = builder.build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Already set, e.g. by a test harness.

    log::set_max_level(level);

    multi
}
