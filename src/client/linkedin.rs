//! `LinkedIn` profile search jobs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Client, Document, JobArguments, JobKind, JobSubmission};
use crate::error::ClientError;

/// How much of each profile the scraper collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScraperMode {
    /// Name, headline and URL only.
    #[default]
    #[serde(rename = "Short")]
    Short,
    /// Full profile.
    #[serde(rename = "Full")]
    Full,
    /// Full profile plus email lookup.
    #[serde(rename = "Full + email search")]
    FullWithEmail,
}

impl ScraperMode {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "Short",
            Self::Full => "Full",
            Self::FullWithEmail => "Full + email search",
        }
    }
}

impl fmt::Display for ScraperMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScraperMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "full" => Ok(Self::Full),
            "full-email" | "full + email search" => Ok(Self::FullWithEmail),
            other => Err(format!("unknown scraper mode: {other}")),
        }
    }
}

/// Arguments for a `LinkedIn` profile search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedInSearchArguments {
    /// Free-text search query.
    pub query: String,
    /// Collection depth.
    #[serde(default)]
    pub scraper_mode: ScraperMode,
    /// Maximum number of profiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

impl LinkedInSearchArguments {
    /// Creates arguments for `query` in the given mode.
    #[must_use]
    pub fn new(query: impl Into<String>, scraper_mode: ScraperMode) -> Self {
        Self {
            query: query.into(),
            scraper_mode,
            max_items: None,
        }
    }
}

impl JobArguments for LinkedInSearchArguments {
    fn kind(&self) -> JobKind {
        JobKind::LinkedinSearch
    }

    fn capability(&self) -> &'static str {
        "searchbyquery"
    }
}

impl Client {
    /// Submits a `LinkedIn` search without waiting.
    pub async fn submit_linkedin_search(
        &self,
        query: &str,
        mode: ScraperMode,
    ) -> Result<JobSubmission, ClientError> {
        self.submit_job(&LinkedInSearchArguments::new(query, mode))
            .await
    }

    /// Searches `LinkedIn` and waits for profiles.
    pub async fn search_linkedin(
        &self,
        query: &str,
        mode: ScraperMode,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(&LinkedInSearchArguments::new(query, mode))
            .await
    }

    /// Searches `LinkedIn` with explicit arguments and waits for profiles.
    pub async fn search_linkedin_with_args(
        &self,
        args: &LinkedInSearchArguments,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(args).await
    }
}
