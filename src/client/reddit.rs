//! Reddit search and scrape jobs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Client, Document, JobArguments, JobKind, JobSubmission};
use crate::error::ClientError;

/// What a Reddit job does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RedditCapability {
    /// Scrape specific post or comment URLs.
    ScrapeUrls,
    /// Search posts.
    #[default]
    SearchPosts,
    /// Search users.
    SearchUsers,
    /// Search subreddits.
    SearchCommunities,
}

impl RedditCapability {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScrapeUrls => "scrapeurls",
            Self::SearchPosts => "searchposts",
            Self::SearchUsers => "searchusers",
            Self::SearchCommunities => "searchcommunities",
        }
    }
}

impl fmt::Display for RedditCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments for a Reddit job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedditArguments {
    /// Capability; written as `arguments.type`.
    #[serde(skip)]
    pub capability: RedditCapability,
    /// URLs for [`RedditCapability::ScrapeUrls`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    /// Queries for the search capabilities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<String>,
    /// Maximum number of items to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

impl RedditArguments {
    /// Scrapes the given URLs.
    #[must_use]
    pub fn scrape_urls(urls: Vec<String>) -> Self {
        Self {
            capability: RedditCapability::ScrapeUrls,
            urls,
            ..Self::default()
        }
    }

    /// Searches posts matching `query`.
    #[must_use]
    pub fn search_posts(query: impl Into<String>) -> Self {
        Self::search(RedditCapability::SearchPosts, query)
    }

    /// Searches users matching `query`.
    #[must_use]
    pub fn search_users(query: impl Into<String>) -> Self {
        Self::search(RedditCapability::SearchUsers, query)
    }

    /// Searches communities matching `query`.
    #[must_use]
    pub fn search_communities(query: impl Into<String>) -> Self {
        Self::search(RedditCapability::SearchCommunities, query)
    }

    fn search(capability: RedditCapability, query: impl Into<String>) -> Self {
        Self {
            capability,
            queries: vec![query.into()],
            ..Self::default()
        }
    }

    /// Caps the number of items. Zero leaves the server default.
    #[must_use]
    pub const fn with_max_items(mut self, max_items: u32) -> Self {
        self.max_items = if max_items == 0 { None } else { Some(max_items) };
        self
    }
}

impl JobArguments for RedditArguments {
    fn kind(&self) -> JobKind {
        JobKind::RedditSearch
    }

    fn capability(&self) -> &'static str {
        self.capability.as_str()
    }
}

impl Client {
    /// Submits a Reddit job without waiting.
    pub async fn submit_reddit(&self, args: &RedditArguments) -> Result<JobSubmission, ClientError> {
        self.submit_job(args).await
    }

    /// Runs a Reddit job and waits for its documents.
    pub async fn reddit_and_wait(
        &self,
        args: &RedditArguments,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(args).await
    }

    /// Scrapes one Reddit URL.
    pub async fn reddit_scrape_url(
        &self,
        url: &str,
        max_items: u32,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(&RedditArguments::scrape_urls(vec![url.to_string()]).with_max_items(max_items))
            .await
    }

    /// Searches Reddit posts.
    pub async fn reddit_search_posts(
        &self,
        query: &str,
        max_items: u32,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(&RedditArguments::search_posts(query).with_max_items(max_items))
            .await
    }

    /// Searches Reddit users.
    pub async fn reddit_search_users(
        &self,
        query: &str,
        max_items: u32,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(&RedditArguments::search_users(query).with_max_items(max_items))
            .await
    }

    /// Searches Reddit communities.
    pub async fn reddit_search_communities(
        &self,
        query: &str,
        max_items: u32,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(&RedditArguments::search_communities(query).with_max_items(max_items))
            .await
    }
}
