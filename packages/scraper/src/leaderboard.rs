//! reqwest-backed [`PageFetcher`] for the public leaderboard endpoint.

use bh_ladder_models::{PageIndex, Region};

use crate::{FetchFailure, FetchResult, FetchSettings, PageFetcher, ScrapeError, payload};

/// Maximum length of the response body preview included in logs.
const BODY_PREVIEW_LEN: usize = 200;

/// Fetches leaderboard pages over HTTP.
///
/// The underlying [`reqwest::Client`] is built once and reused for every
/// page so connections are pooled across a run.
#[derive(Debug, Clone)]
pub struct LeaderboardClient {
    client: reqwest::Client,
    url_template: String,
}

impl LeaderboardClient {
    /// Builds a client from the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidTemplate`] if the template has no
    /// `{page}` placeholder, or [`ScrapeError::Http`] if the HTTP client
    /// cannot be constructed.
    pub fn new(settings: &FetchSettings) -> Result<Self, ScrapeError> {
        if !settings.url_template.contains("{page}") {
            return Err(ScrapeError::InvalidTemplate {
                template: settings.url_template.clone(),
                message: "missing {page} placeholder".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            url_template: settings.url_template.clone(),
        })
    }

    /// Builds the request URL for `page` of `region`.
    #[must_use]
    pub fn build_url(&self, region: Region, page: PageIndex) -> String {
        self.url_template
            .replace("{region}", region.code())
            .replace("{page}", &page.to_string())
    }
}

impl PageFetcher for LeaderboardClient {
    async fn fetch_page(&self, region: Region, page: PageIndex) -> FetchResult {
        let url = self.build_url(region, page);
        log::debug!("Fetching {region} page {page}: {url}");

        let response = self.client.get(&url).send().await.map_err(classify)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchFailure::HttpStatus(status.as_u16()));
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::Timeout
            } else {
                FetchFailure::Parse(format!("failed to read body: {e}"))
            }
        })?;

        let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
            log::debug!("{region} page {page}: invalid JSON ({e}), body preview: {preview}");
            FetchFailure::Parse(e.to_string())
        })?;

        let entries = payload::parse_entries(&body, region).inspect_err(|e| {
            log::debug!("{region} page {page}: {e}");
        })?;
        log::debug!("{region} page {page}: {} entries", entries.len());

        Ok(entries)
    }
}

/// Maps a request error onto the fetch failure taxonomy.
fn classify(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else if let Some(status) = error.status() {
        FetchFailure::HttpStatus(status.as_u16())
    } else {
        FetchFailure::Transport(error.to_string())
    }
}
