//! Concurrent query fan-out.
//!
//! A batchable tool accepts either one query or an array of queries. Each
//! query in a batch runs as its own task through the full submit-and-wait
//! pipeline; every task is awaited (a join, not a race) and the outcomes are
//! merged into one [`BatchResponse`]. A failing, panicking or cancelled
//! branch only ever produces an error entry for its own query.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::tool::ToolParams;
use crate::client::Document;
use crate::error::{AgentError, ClientError};

/// Query input decoded from tool parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// Singular field (`query` / `url`).
    Single(String),
    /// Array field (`queries` / `urls`), non-string and blank entries dropped.
    Batch(Vec<String>),
}

impl QueryInput {
    /// Decodes the input from `params`, preferring the batch field.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolExecution`] when neither field is usable.
    pub fn from_params(
        tool: &str,
        params: &ToolParams,
        single_key: &str,
        batch_key: &str,
    ) -> Result<Self, AgentError> {
        if let Some(Value::Array(items)) = params.get(batch_key) {
            let queries = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string)
                .collect();
            return Ok(Self::Batch(queries));
        }

        match params.get(single_key).and_then(Value::as_str).map(str::trim) {
            Some(single) if !single.is_empty() => Ok(Self::Single(single.to_string())),
            _ => Err(AgentError::ToolExecution {
                name: tool.to_string(),
                message: format!("missing required parameter '{single_key}' or '{batch_key}'"),
            }),
        }
    }
}

/// Outcome of one fan-out branch.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Originating query.
    pub query: String,
    /// Documents, in server order. Empty on failure.
    pub documents: Vec<Document>,
    /// Error message when the branch failed.
    pub error: Option<String>,
}

impl QueryResult {
    fn from_outcome(query: String, outcome: Result<Vec<Document>, ClientError>) -> Self {
        match outcome {
            Ok(documents) => Self {
                query,
                documents,
                error: None,
            },
            Err(e) => Self::failed(query, e.to_string()),
        }
    }

    fn failed(query: String, message: String) -> Self {
        Self {
            query,
            documents: Vec::new(),
            error: Some(message),
        }
    }

    /// Whether the branch succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Wire shape of a single-query result: the document array on success,
    /// an error object with an empty document list on failure.
    #[must_use]
    pub fn to_single_json(&self) -> Value {
        match &self.error {
            None => serde_json::to_value(&self.documents).unwrap_or(Value::Array(Vec::new())),
            Some(message) => serde_json::json!({
                "error": true,
                "query": self.query,
                "error_msg": message,
                "documents": [],
            }),
        }
    }
}

/// Per-query error record in a [`BatchResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    /// Always `true`; lets the model spot error objects.
    pub error: bool,
    /// Query that failed.
    pub query: String,
    /// Failure description.
    pub error_msg: String,
}

/// Aggregate of a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Documents from every successful branch.
    pub documents: Vec<Document>,
    /// Number of queries run.
    pub total_queries: usize,
    /// Branches that succeeded.
    pub successful_queries: usize,
    /// Branches that failed.
    pub failed_queries: usize,
    /// One entry per failed branch; omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<QueryError>,
}

impl BatchResponse {
    /// Merges branch results. Order of documents across branches follows
    /// the order of `results`.
    #[must_use]
    pub fn from_results(results: Vec<QueryResult>) -> Self {
        let total_queries = results.len();
        let mut documents = Vec::new();
        let mut errors = Vec::new();

        for result in results {
            match result.error {
                None => documents.extend(result.documents),
                Some(error_msg) => errors.push(QueryError {
                    error: true,
                    query: result.query,
                    error_msg,
                }),
            }
        }

        Self {
            documents,
            total_queries,
            successful_queries: total_queries - errors.len(),
            failed_queries: errors.len(),
            errors,
        }
    }
}

/// Runs `run` once per query, concurrently, and waits for every branch.
///
/// Results are returned in query order. A branch that panics or is aborted
/// is reported as a failure of its query.
pub async fn fan_out<F, Fut>(queries: Vec<String>, run: F) -> Vec<QueryResult>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<Document>, ClientError>> + Send + 'static,
{
    info!(queries = queries.len(), "fanning out queries");

    let mut handles = Vec::with_capacity(queries.len());
    for query in queries {
        let handle = tokio::spawn(run(query.clone()));
        handles.push((query, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (query, handle) in handles {
        let result = match handle.await {
            Ok(outcome) => QueryResult::from_outcome(query, outcome),
            Err(e) => {
                warn!(query = %query, error = %e, "query task did not complete");
                QueryResult::failed(query, format!("query task failed: {e}"))
            }
        };
        debug!(
            query = %result.query,
            documents = result.documents.len(),
            ok = result.is_success(),
            "query finished"
        );
        results.push(result);
    }

    results
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            ..Document::default()
        }
    }

    fn params(value: Value) -> ToolParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn test_input_prefers_batch_and_drops_non_strings() {
        let input = QueryInput::from_params(
            "search_twitter",
            &params(json!({"query": "ignored", "queries": ["$BTC", 7, "", "  $ETH "]})),
            "query",
            "queries",
        );
        assert_eq!(
            input.ok(),
            Some(QueryInput::Batch(vec!["$BTC".to_string(), "$ETH".to_string()]))
        );
    }

    #[test]
    fn test_input_single_and_missing() {
        let single = QueryInput::from_params(
            "search_web",
            &params(json!({"url": "https://example.com"})),
            "url",
            "urls",
        );
        assert_eq!(
            single.ok(),
            Some(QueryInput::Single("https://example.com".to_string()))
        );

        let missing =
            QueryInput::from_params("search_web", &params(json!({})), "url", "urls");
        assert!(matches!(missing, Err(AgentError::ToolExecution { .. })));
    }

    #[test]
    fn test_input_empty_batch_is_not_an_error() {
        let input = QueryInput::from_params(
            "search_twitter",
            &params(json!({"queries": [1, null]})),
            "query",
            "queries",
        );
        assert_eq!(input.ok(), Some(QueryInput::Batch(Vec::new())));
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let queries = vec!["q1".to_string(), "q2".to_string(), "q3".to_string()];

        let results = fan_out(queries, |query| async move {
            if query == "q2" {
                Err(ClientError::Status {
                    status: 500,
                    url: "http://backend/v1/search/live".to_string(),
                    body: "boom".to_string(),
                })
            } else {
                Ok(vec![doc(&format!("{query}-a")), doc(&format!("{query}-b"))])
            }
        })
        .await;

        let batch = BatchResponse::from_results(results);
        assert_eq!(batch.total_queries, 3);
        assert_eq!(batch.successful_queries, 2);
        assert_eq!(batch.failed_queries, 1);
        assert_eq!(batch.documents.len(), 4);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].query, "q2");
        assert!(batch.errors[0].error_msg.contains("500"));
    }

    #[tokio::test]
    async fn test_panicking_branch_is_recorded() {
        let results = fan_out(vec!["ok".to_string(), "bad".to_string()], |query| async move {
            assert_ne!(query, "bad", "branch blew up");
            Ok(vec![doc(&query)])
        })
        .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert_eq!(results[1].query, "bad");
    }

    #[tokio::test(start_paused = true)]
    async fn test_branches_run_concurrently() {
        let start = tokio::time::Instant::now();
        let queries = (0..5).map(|i| format!("q{i}")).collect();

        let results = fan_out(queries, |query| async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(vec![doc(&query)])
        })
        .await;

        assert_eq!(results.len(), 5);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_batch_wire_shape_omits_empty_errors() {
        let batch = BatchResponse::from_results(vec![QueryResult {
            query: "q".to_string(),
            documents: vec![doc("hello")],
            error: None,
        }]);
        let wire = serde_json::to_value(&batch).unwrap_or_default();
        assert_eq!(wire["total_queries"], 1);
        assert!(wire.get("errors").is_none());
    }

    #[test]
    fn test_single_error_shape() {
        let result = QueryResult::failed("$DOGE".to_string(), "job timed out".to_string());
        assert_eq!(
            result.to_single_json(),
            json!({"error": true, "query": "$DOGE", "error_msg": "job timed out", "documents": []})
        );
    }
}
