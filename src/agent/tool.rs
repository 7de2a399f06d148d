//! Tool abstraction for LLM function-calling.
//!
//! A [`Tool`] exposes a name, description and JSON-schema parameters to the
//! model, and executes with the decoded argument map. A [`ToolSet`] owns the
//! tools offered in one query and dispatches [`ToolCall`]s to them. Every
//! failure on the way (oversized or invalid arguments, unknown tool, tool
//! error) becomes an error [`ToolResult`] fed back to the model instead of
//! aborting the loop.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::AgentError;

/// Tool arguments as decoded from the model's JSON.
pub type ToolParams = Map<String, Value>;

/// A tool definition sent to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name; must match the dispatch key in [`ToolSet`].
    pub name: String,
    /// What the tool does, for the model.
    pub description: String,
    /// JSON Schema object describing the parameters.
    pub parameters: Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id.
    pub id: String,
    /// Tool to invoke.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

/// The outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Call this result answers.
    pub tool_call_id: String,
    /// Result content (tool output, or an error description).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

/// A capability the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the parameters.
    fn parameters(&self) -> Value;

    /// Full definition for the provider.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }

    /// Runs the tool.
    ///
    /// Backend failures should be reported inside the returned string where
    /// partial data is still useful; an `Err` is turned into an error result
    /// for the model.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolExecution`] for invalid parameters or
    /// unrecoverable failures, [`AgentError::Cancelled`] on cancellation.
    async fn execute(
        &self,
        params: ToolParams,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError>;
}

/// The tools offered to the model in one query.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
    max_args_bytes: Option<usize>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .field("max_args_bytes", &self.max_args_bytes)
            .finish()
    }
}

impl ToolSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. On duplicate names the first registered wins.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Rejects tool arguments longer than `max` bytes.
    #[must_use]
    pub const fn with_max_args_bytes(mut self, max: usize) -> Self {
        self.max_args_bytes = Some(max);
        self
    }

    /// Definitions for the provider request.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Tool names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Returns `true` if the set contains no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Dispatches one call. Never fails; errors become error results.
    pub async fn execute(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolResult {
        match self.dispatch(call, cancel).await {
            Ok(content) => ToolResult {
                tool_call_id: call.id.clone(),
                content,
                is_error: false,
            },
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                ToolResult {
                    tool_call_id: call.id.clone(),
                    content: format!("Error: {e}"),
                    is_error: true,
                }
            }
        }
    }

    async fn dispatch(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        if let Some(max) = self.max_args_bytes
            && call.arguments.len() > max
        {
            return Err(AgentError::ToolExecution {
                name: call.name.clone(),
                message: format!(
                    "tool arguments too large ({} bytes, max {max})",
                    call.arguments.len()
                ),
            });
        }

        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == call.name)
            .ok_or_else(|| AgentError::ToolExecution {
                name: call.name.clone(),
                message: format!("unknown tool; available: {}", self.names().join(", ")),
            })?;

        let params = parse_arguments(&call.arguments).map_err(|message| {
            AgentError::ToolExecution {
                name: call.name.clone(),
                message,
            }
        })?;

        debug!(tool = %call.name, call_id = %call.id, "executing tool");
        tool.execute(params, cancel).await
    }
}

fn parse_arguments(raw: &str) -> Result<ToolParams, String> {
    if raw.trim().is_empty() {
        return Ok(ToolParams::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("arguments must be a JSON object, got {other}")),
        Err(e) => Err(format!("invalid JSON arguments: {e}")),
    }
}
