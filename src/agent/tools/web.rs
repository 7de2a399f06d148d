//! `search_web` tool.

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::{optional_u32, run_queries};
use crate::agent::fanout::QueryInput;
use crate::agent::tool::{Tool, ToolParams};
use crate::client::{Client, WebScrapeArguments};
use crate::error::AgentError;

const NAME: &str = "search_web";

/// Scrapes web pages through the job backend.
///
/// A single `url` fails the call on error so the model sees the failure
/// directly; a `urls` batch reports failures per URL in the aggregate.
#[derive(Debug, Clone)]
pub struct WebScrapeTool {
    client: Client,
}

impl WebScrapeTool {
    /// Creates the tool over `client`.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebScrapeTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Web search using the provided url, or several urls scraped concurrently."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Web scrape url" },
                "urls": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Web scrape urls, executed concurrently."
                },
                "max_pages": {
                    "type": "integer",
                    "description": "Maximum pages per url. Server default when omitted."
                }
            }
        })
    }

    async fn execute(
        &self,
        params: ToolParams,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let input = QueryInput::from_params(NAME, &params, "url", "urls")?;
        let max_pages = optional_u32(&params, "max_pages");
        let scrape_args = move |url: String| {
            let mut args = WebScrapeArguments::new(url);
            args.max_pages = max_pages;
            args
        };

        match input {
            QueryInput::Single(url) => {
                let docs = self
                    .client
                    .run_job_with_cancel(&scrape_args(url.clone()), cancel)
                    .await
                    .map_err(|e| {
                        let message = if e.is_timeout() {
                            format!("web search timed out for URL {url}: {e}")
                        } else {
                            e.to_string()
                        };
                        AgentError::ToolExecution {
                            name: NAME.to_string(),
                            message,
                        }
                    })?;
                serde_json::to_string(&docs).map_err(|e| AgentError::ToolExecution {
                    name: NAME.to_string(),
                    message: format!("failed to encode result: {e}"),
                })
            }
            batch @ QueryInput::Batch(_) => {
                run_queries(NAME, batch, |url| {
                    let client = self.client.clone();
                    let cancel = cancel.clone();
                    let args = scrape_args(url);
                    async move { client.run_job_with_cancel(&args, &cancel).await }
                })
                .await
            }
        }
    }
}
