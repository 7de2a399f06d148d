//! `search_twitter` tool.

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::{optional_u32, run_queries};
use crate::agent::fanout::QueryInput;
use crate::agent::tool::{Tool, ToolParams};
use crate::client::{Client, TwitterSearchArguments};
use crate::error::AgentError;

const NAME: &str = "search_twitter";

const DESCRIPTION: &str = "Search Twitter using the provided query or queries. Include operators \
    like 'since:YYYY-MM-DD' (typically one day before today). Defaults to last 1 day if none \
    provided. You can provide a single 'query' or multiple 'queries' as an array; multiple \
    queries are executed concurrently. CRITICAL: Use 'from:username' format with NO SPACE after \
    'from:' (e.g., 'from:JamesWynnReal', NOT 'from: JamesWynnReal'). Randomly sample accounts, \
    do not exhaustively query all accounts. Use hashtags and keywords like \
    '#BTC OR #ETH OR bitcoin OR ethereum' to find relevant tweets.";

/// Searches Twitter through the job backend, one job per query.
#[derive(Debug, Clone)]
pub struct TwitterSearchTool {
    client: Client,
}

impl TwitterSearchTool {
    /// Creates the tool over `client`.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for TwitterSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Twitter advanced search query. CRITICAL: Use 'from:username' \
                        format with NO SPACE after 'from:'. Include operators like \
                        'since:YYYY-MM-DD', hashtags (#BTC) and keywords."
                },
                "queries": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Twitter advanced search queries executed concurrently. \
                        Each follows the same format as 'query'."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum tweets per query. Server default when omitted."
                }
            }
        })
    }

    async fn execute(
        &self,
        params: ToolParams,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let input = QueryInput::from_params(NAME, &params, "query", "queries")?;
        let max_results = optional_u32(&params, "max_results");

        run_queries(NAME, input, |query| {
            let client = self.client.clone();
            let cancel = cancel.clone();
            async move {
                let mut args = TwitterSearchArguments::new(query);
                args.max_results = max_results;
                client.run_job_with_cancel(&args, &cancel).await
            }
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::fanout::BatchResponse;
    use crate::client::tests::test_client;
    use crate::client::{Document, JOB_ENDPOINT};
    use mockito::{Matcher, Mock, Server, ServerGuard};

    fn params(value: Value) -> ToolParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    /// Mocks a whole job for `query`: submit, one `done` status, results.
    async fn mock_job(server: &mut ServerGuard, query: &str, job_id: &str, docs: &str) -> Vec<Mock> {
        let submit = server
            .mock("POST", JOB_ENDPOINT)
            .match_body(Matcher::PartialJson(json!({"arguments": {"query": query}})))
            .with_status(200)
            .with_body(json!({"uuid": job_id}).to_string())
            .create_async()
            .await;
        let status = server
            .mock("GET", format!("{JOB_ENDPOINT}/status/{job_id}").as_str())
            .with_status(200)
            .with_body(r#"{"status":"done"}"#)
            .create_async()
            .await;
        let result = server
            .mock("GET", format!("{JOB_ENDPOINT}/result/{job_id}").as_str())
            .with_status(200)
            .with_body(docs)
            .create_async()
            .await;
        vec![submit, status, result]
    }

    #[tokio::test]
    async fn test_batch_with_one_failing_query() {
        let mut server = Server::new_async().await;
        let _q1 = mock_job(
            &mut server,
            "from:alice $BTC",
            "job-1",
            r#"[{"id":"t1","content":"up"},{"id":"t2","content":"flat"}]"#,
        )
        .await;
        let _q2 = server
            .mock("POST", JOB_ENDPOINT)
            .match_body(Matcher::PartialJson(
                json!({"arguments": {"query": "from:bob $ETH"}}),
            ))
            .with_status(500)
            .with_body("worker pool exhausted")
            .create_async()
            .await;
        let _q3 = mock_job(
            &mut server,
            "from:carol $SOL",
            "job-3",
            r#"[{"id":"t3","content":"down"}]"#,
        )
        .await;

        let tool = TwitterSearchTool::new(test_client(&server.url(), None));
        let output = tool
            .execute(
                params(json!({"queries": ["from:alice $BTC", "from:bob $ETH", "from:carol $SOL"]})),
                &CancellationToken::new(),
            )
            .await
            .unwrap_or_else(|e| panic!("tool failed: {e}"));

        let batch: BatchResponse =
            serde_json::from_str(&output).unwrap_or_else(|e| panic!("bad output {output}: {e}"));
        assert_eq!(batch.total_queries, 3);
        assert_eq!(batch.successful_queries, 2);
        assert_eq!(batch.failed_queries, 1);
        assert_eq!(batch.documents.len(), 3);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].query, "from:bob $ETH");
        assert!(batch.errors[0].error_msg.contains("500"));
    }

    #[tokio::test]
    async fn test_single_query_matches_batch_of_one() {
        let mut server = Server::new_async().await;
        let _job = mock_job(
            &mut server,
            "#BTC since:2024-01-01",
            "job-7",
            r#"[{"id":"t1","content":"gm"}]"#,
        )
        .await;

        let tool = TwitterSearchTool::new(test_client(&server.url(), None));
        let cancel = CancellationToken::new();

        let single = tool
            .execute(params(json!({"query": "#BTC since:2024-01-01"})), &cancel)
            .await
            .unwrap_or_else(|e| panic!("single failed: {e}"));
        let batch = tool
            .execute(params(json!({"queries": ["#BTC since:2024-01-01"]})), &cancel)
            .await
            .unwrap_or_else(|e| panic!("batch failed: {e}"));

        let single: Vec<Document> =
            serde_json::from_str(&single).unwrap_or_else(|e| panic!("{e}"));
        let batch: BatchResponse = serde_json::from_str(&batch).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(single, batch.documents);
    }

    #[tokio::test]
    async fn test_single_query_failure_is_error_object() {
        let mut server = Server::new_async().await;
        let _submit = server
            .mock("POST", JOB_ENDPOINT)
            .with_status(200)
            .with_body(r#"{"error":"rate limited"}"#)
            .create_async()
            .await;

        let tool = TwitterSearchTool::new(test_client(&server.url(), None));
        let output = tool
            .execute(params(json!({"query": "$DOGE"})), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| panic!("tool failed: {e}"));

        let value: Value = serde_json::from_str(&output).unwrap_or_default();
        assert_eq!(value["error"], true);
        assert_eq!(value["query"], "$DOGE");
        assert!(value["error_msg"].as_str().is_some_and(|m| m.contains("rate limited")));
        assert_eq!(value["documents"], json!([]));
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty_array() {
        let server = Server::new_async().await;
        let tool = TwitterSearchTool::new(test_client(&server.url(), None));

        let output = tool
            .execute(params(json!({"queries": [42, null]})), &CancellationToken::new())
            .await
            .unwrap_or_else(|e| panic!("tool failed: {e}"));

        assert_eq!(output, "[]");
    }

    #[tokio::test]
    async fn test_max_results_forwarded() {
        let mut server = Server::new_async().await;
        let submit = server
            .mock("POST", JOB_ENDPOINT)
            .match_body(Matcher::PartialJson(
                json!({"arguments": {"query": "$ETH", "max_results": 25}}),
            ))
            .with_status(200)
            .with_body(r#"{"uuid":"job-9"}"#)
            .create_async()
            .await;
        let _status = server
            .mock("GET", format!("{JOB_ENDPOINT}/status/job-9").as_str())
            .with_status(200)
            .with_body(r#"{"status":"done"}"#)
            .create_async()
            .await;
        let _result = server
            .mock("GET", format!("{JOB_ENDPOINT}/result/job-9").as_str())
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let tool = TwitterSearchTool::new(test_client(&server.url(), None));
        let output = tool
            .execute(
                params(json!({"query": "$ETH", "max_results": 25})),
                &CancellationToken::new(),
            )
            .await
            .unwrap_or_else(|e| panic!("tool failed: {e}"));

        assert_eq!(output, "[]");
        submit.assert_async().await;
    }
}
