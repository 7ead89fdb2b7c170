//! Scrape configuration.
//!
//! Values are resolved in three layers: built-in defaults, an optional
//! TOML file, then command-line overrides. Every loop receives the
//! resolved [`ScrapeConfig`] (or the [`LoopSettings`] derived from it)
//! explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bh_ladder_models::{PageIndex, Region};
use bh_ladder_scraper::{DEFAULT_URL_TEMPLATE, DEFAULT_USER_AGENT, FetchSettings};
use serde::Deserialize;

use crate::IngestError;

/// Resolved settings for a scrape run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrapeConfig {
    /// Region scraped when no region is given on the command line.
    pub region: Region,
    /// Per-request timeout in seconds.
    pub timeout_seconds: f64,
    /// Pause between consecutive page requests in seconds.
    pub pause_seconds: f64,
    /// Pause between retry attempts in seconds.
    pub retry_pause_seconds: f64,
    /// Attempts per failed page in the retry loop.
    pub max_retry_attempts: u32,
    /// Consecutive non-data pages after which the scrape stops.
    pub stop_after_empty_pages: u32,
    /// Last page to fetch, if capped.
    pub max_page: Option<PageIndex>,
    /// Root under which the dated output folder is created.
    pub output_directory: PathBuf,
    /// Endpoint template with `{region}` and `{page}` placeholders.
    pub url_template: String,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            timeout_seconds: 12.0,
            pause_seconds: 0.0,
            retry_pause_seconds: 0.5,
            max_retry_attempts: 3,
            stop_after_empty_pages: 10,
            max_page: None,
            output_directory: PathBuf::from("."),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Command-line values that take precedence over the file and defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub region: Option<Region>,
    pub timeout_seconds: Option<f64>,
    pub pause_seconds: Option<f64>,
    pub stop_after_empty_pages: Option<u32>,
    pub max_page: Option<PageIndex>,
    pub output_directory: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Copies every set override into `config`.
    pub fn apply(self, config: &mut ScrapeConfig) {
        if let Some(region) = self.region {
            config.region = region;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        if let Some(pause) = self.pause_seconds {
            config.pause_seconds = pause;
        }
        if let Some(stop) = self.stop_after_empty_pages {
            config.stop_after_empty_pages = stop;
        }
        if self.max_page.is_some() {
            config.max_page = self.max_page;
        }
        if let Some(dir) = self.output_directory {
            config.output_directory = dir;
        }
    }
}

/// The subset of the configuration the scrape and retry loops consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub pause: Duration,
    pub retry_pause: Duration,
    pub max_retry_attempts: u32,
    pub stop_after_empty_pages: u32,
    pub max_page: Option<PageIndex>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        ScrapeConfig::default().loop_settings()
    }
}

impl ScrapeConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// Values are not range-checked here; [`Self::resolve`] validates once
    /// overrides have been applied.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] on malformed TOML or unknown keys.
    pub fn from_toml_str(contents: &str) -> Result<Self, IngestError> {
        toml::from_str(contents).map_err(|e| IngestError::Config(e.to_string()))
    }

    /// Loads and parses a TOML file. See [`Self::from_toml_str`].
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`], prefixed with the path, if the file
    /// cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, IngestError> {
        let with_path = |msg: String| IngestError::Config(format!("{}: {msg}", path.display()));

        let contents = std::fs::read_to_string(path).map_err(|e| with_path(e.to_string()))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            IngestError::Config(msg) => with_path(msg),
            other => other,
        })
    }

    /// Loads `path` if given, otherwise starts from defaults, then applies
    /// `overrides` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the file is unusable or the final
    /// values are out of range.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, IngestError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<(), IngestError> {
        if !(self.timeout_seconds.is_finite() && self.timeout_seconds > 0.0) {
            return Err(IngestError::Config(format!(
                "timeout_seconds must be positive, got {}",
                self.timeout_seconds
            )));
        }
        for (name, value) in [
            ("pause_seconds", self.pause_seconds),
            ("retry_pause_seconds", self.retry_pause_seconds),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(IngestError::Config(format!(
                    "{name} must be zero or positive, got {value}"
                )));
            }
        }
        if self.max_retry_attempts == 0 {
            return Err(IngestError::Config(
                "max_retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.stop_after_empty_pages == 0 {
            return Err(IngestError::Config(
                "stop_after_empty_pages must be at least 1".to_string(),
            ));
        }
        if self.max_page == Some(0) {
            return Err(IngestError::Config(
                "max_page must be at least 1".to_string(),
            ));
        }
        if !self.url_template.contains("{page}") {
            return Err(IngestError::Config(format!(
                "url_template must contain {{page}}: {}",
                self.url_template
            )));
        }
        Ok(())
    }

    /// Request settings for the page fetcher.
    #[must_use]
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            url_template: self.url_template.clone(),
            timeout: seconds(self.timeout_seconds),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Pacing and stopping settings for the scrape and retry loops.
    #[must_use]
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            pause: seconds(self.pause_seconds),
            retry_pause: seconds(self.retry_pause_seconds),
            max_retry_attempts: self.max_retry_attempts,
            stop_after_empty_pages: self.stop_after_empty_pages,
            max_page: self.max_page,
        }
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
