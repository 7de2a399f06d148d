//! Web page scrape jobs.

use serde::{Deserialize, Serialize};

use super::{Client, Document, JobArguments, JobKind, JobSubmission};
use crate::error::ClientError;

/// Arguments for scraping a web page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebScrapeArguments {
    /// Page to scrape.
    pub url: String,
    /// How many links deep to follow from `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    /// Maximum number of pages to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl WebScrapeArguments {
    /// Creates arguments for a single page.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Follows links up to `depth` levels.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Caps the number of pages.
    #[must_use]
    pub const fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = Some(pages);
        self
    }
}

impl JobArguments for WebScrapeArguments {
    fn kind(&self) -> JobKind {
        JobKind::WebScrape
    }

    fn capability(&self) -> &'static str {
        "scraper"
    }
}

impl Client {
    /// Submits a scrape of `url` without waiting.
    pub async fn submit_web_scrape(&self, url: &str) -> Result<JobSubmission, ClientError> {
        self.submit_job(&WebScrapeArguments::new(url)).await
    }

    /// Scrapes `url` and waits for the page documents.
    pub async fn scrape_web(&self, url: &str) -> Result<Vec<Document>, ClientError> {
        self.run_job(&WebScrapeArguments::new(url)).await
    }

    /// Scrapes with explicit arguments and waits for the page documents.
    pub async fn scrape_web_with_args(
        &self,
        args: &WebScrapeArguments,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(args).await
    }
}
