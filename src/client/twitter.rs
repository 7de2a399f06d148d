//! Twitter search jobs.

use serde::{Deserialize, Serialize};

use super::{Client, Document, JobArguments, JobKind, JobSubmission};
use crate::error::ClientError;

/// Arguments for a Twitter query search.
///
/// `query` uses Twitter advanced search syntax (`from:`, `since:`, `-is:retweet`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterSearchArguments {
    /// Search query.
    pub query: String,
    /// Maximum number of tweets to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// Pagination cursor from a previous search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl TwitterSearchArguments {
    /// Creates arguments for `query` with server defaults.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Caps the number of results.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

impl JobArguments for TwitterSearchArguments {
    fn kind(&self) -> JobKind {
        JobKind::TwitterSearch
    }

    fn capability(&self) -> &'static str {
        "searchbyquery"
    }
}

impl Client {
    /// Submits a Twitter search for `query` without waiting.
    pub async fn submit_twitter_search(&self, query: &str) -> Result<JobSubmission, ClientError> {
        self.submit_job(&TwitterSearchArguments::new(query)).await
    }

    /// Searches Twitter for `query` and waits for the tweets.
    pub async fn search_twitter(&self, query: &str) -> Result<Vec<Document>, ClientError> {
        self.run_job(&TwitterSearchArguments::new(query)).await
    }

    /// Searches Twitter with explicit arguments and waits for the tweets.
    pub async fn search_twitter_with_args(
        &self,
        args: &TwitterSearchArguments,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::JobRequest;
    use serde_json::json;

    #[test]
    fn test_search_arguments_wire_shape() {
        let args = TwitterSearchArguments::new("$BTC -is:retweet").with_max_results(50);
        let req = JobRequest::new(&args).unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(
            serde_json::to_value(&req).unwrap_or_default(),
            json!({
                "type": "twitter",
                "arguments": {"type": "searchbyquery", "query": "$BTC -is:retweet", "max_results": 50}
            })
        );
    }
}
