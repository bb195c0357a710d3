use std::time::Instant;

use reqwest::Client;
use tracing::info;

use crate::config::{ExtractOptions, FetchConfig};
use crate::error::ScrapeError;
use crate::parser::{self, LiveMatchRecord};

/// HTTP client for schedule pages.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// GET a page and decode it as UTF-8, replacing invalid sequences.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let start = Instant::now();
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        info!(
            "Fetched {} ({} bytes in {} ms)",
            url,
            bytes.len(),
            start.elapsed().as_millis()
        );
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Live pipeline: fetch one schedule page and extract its open matches.
    pub async fn scrape_matches(
        &self,
        url: &str,
        opts: &ExtractOptions,
    ) -> Result<Vec<LiveMatchRecord>, ScrapeError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ScrapeError::EmptyUrl);
        }
        let html = self.fetch_page(url).await?;
        parser::extract_matches(&html, opts)
    }
}
