//! Job-backed tools offered to the model.
//!
//! Both tools are batchable: a singular field runs one branch of the
//! fan-out and returns that branch's raw shape, an array field runs every
//! entry concurrently and returns the aggregate.

pub mod twitter;
pub mod web;

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

pub use twitter::TwitterSearchTool;
pub use web::WebScrapeTool;

use super::fanout::{BatchResponse, QueryInput, fan_out};
use super::tool::ToolSet;
use crate::client::{Client, Document};
use crate::error::{AgentError, ClientError};

/// The standard tool set for data collection queries.
#[must_use]
pub fn data_collection_tools(client: &Client, max_args_bytes: usize) -> ToolSet {
    ToolSet::new()
        .with_tool(Arc::new(TwitterSearchTool::new(client.clone())))
        .with_tool(Arc::new(WebScrapeTool::new(client.clone())))
        .with_max_args_bytes(max_args_bytes)
}

/// Runs decoded input through the fan-out and renders the tool output.
///
/// An empty batch renders as `[]`.
pub(crate) async fn run_queries<F, Fut>(
    tool: &str,
    input: QueryInput,
    run: F,
) -> Result<String, AgentError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<Document>, ClientError>> + Send + 'static,
{
    let value = match input {
        QueryInput::Single(query) => fan_out(vec![query], run)
            .await
            .pop()
            .map_or_else(|| Value::Array(Vec::new()), |result| result.to_single_json()),
        QueryInput::Batch(queries) if queries.is_empty() => Value::Array(Vec::new()),
        QueryInput::Batch(queries) => {
            let batch = BatchResponse::from_results(fan_out(queries, run).await);
            serde_json::to_value(batch).map_err(|e| encode_error(tool, &e))?
        }
    };

    serde_json::to_string(&value).map_err(|e| encode_error(tool, &e))
}

fn encode_error(tool: &str, e: &serde_json::Error) -> AgentError {
    AgentError::ToolExecution {
        name: tool.to_string(),
        message: format!("failed to encode result: {e}"),
    }
}

/// Reads an optional positive integer parameter.
pub(crate) fn optional_u32(params: &super::tool::ToolParams, key: &str) -> Option<u32> {
    params
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
}
