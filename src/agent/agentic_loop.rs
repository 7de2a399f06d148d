//! Agentic tool-calling loop.
//!
//! Drives the LLM ↔ tool round-trip: sends the conversation to the model,
//! executes any tool calls in the response, appends the results, and
//! repeats until the model stops asking for tools or the iteration cap is
//! reached. Hitting the cap is a normal stop; the caller still asks for the
//! final answer afterwards.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::message::{ChatMessage, ChatRequest, ChatResponse, TokenUsage};
use super::provider::LlmProvider;
use super::tool::ToolSet;
use crate::error::AgentError;

/// Bounds on one loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLimits {
    /// Round-trips that may execute tools.
    pub max_iterations: usize,
    /// Model calls per iteration while no tool has been selected.
    pub max_attempts: usize,
}

/// What a loop run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Iterations that executed at least one tool.
    pub iterations: usize,
    /// Tool calls executed.
    pub tool_calls: usize,
    /// Tool calls that produced an error result.
    pub failed_tool_calls: usize,
    /// Summed usage over every model call.
    pub usage: TokenUsage,
}

/// Runs the loop: model → tool calls → tool results → model → …
///
/// `request.messages` is extended in place with every assistant turn and
/// tool result, and `request.tools` is set from `tools`. Tools run one at a
/// time in the order the model listed them; batchable tools fan out
/// internally.
///
/// # Errors
///
/// Returns [`AgentError::NoToolSelected`] when the model never selects a
/// tool within `max_attempts` calls of the first iteration,
/// [`AgentError::Cancelled`] when `cancel` fires, and any provider error.
pub async fn agentic_loop(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    tools: &ToolSet,
    limits: LoopLimits,
    cancel: &CancellationToken,
) -> Result<LoopOutcome, AgentError> {
    request.tools = tools.definitions();
    let mut outcome = LoopOutcome::default();

    for iteration in 0..limits.max_iterations {
        let Some(response) =
            select_tools(provider, request, limits.max_attempts, &mut outcome, cancel).await?
        else {
            if outcome.tool_calls == 0 {
                return Err(AgentError::NoToolSelected {
                    attempts: limits.max_attempts,
                    tools: tools.names().join(", "),
                });
            }
            debug!(iteration, "model requested no further tools");
            break;
        };

        debug!(
            iteration,
            tool_count = response.tool_calls.len(),
            "executing tool calls"
        );
        request.messages.push(ChatMessage::assistant_tool_calls(
            response.content.clone(),
            response.tool_calls.clone(),
        ));

        for call in &response.tool_calls {
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            let result = tools.execute(call, cancel).await;
            debug!(
                tool = %call.name,
                call_id = %call.id,
                is_error = result.is_error,
                bytes = result.content.len(),
                "tool execution complete"
            );
            outcome.tool_calls += 1;
            if result.is_error {
                outcome.failed_tool_calls += 1;
            }
            request
                .messages
                .push(ChatMessage::tool(result.tool_call_id, result.content));
        }
        outcome.iterations += 1;
    }

    info!(
        iterations = outcome.iterations,
        tool_calls = outcome.tool_calls,
        failed_tool_calls = outcome.failed_tool_calls,
        "tool loop finished"
    );
    Ok(outcome)
}

/// Asks the model up to `max_attempts` times for a tool selection.
///
/// Text returned alongside no tools is kept in the conversation. Returns
/// `None` when every attempt came back without tool calls.
async fn select_tools(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    max_attempts: usize,
    outcome: &mut LoopOutcome,
    cancel: &CancellationToken,
) -> Result<Option<ChatResponse>, AgentError> {
    for attempt in 0..max_attempts {
        let response = chat_cancellable(provider, request, cancel).await?;
        outcome.usage.accumulate(response.usage);

        if !response.tool_calls.is_empty() {
            return Ok(Some(response));
        }

        debug!(attempt, "model response without tool calls");
        if !response.content.trim().is_empty() {
            request
                .messages
                .push(ChatMessage::assistant(response.content));
        }
    }
    Ok(None)
}

/// Runs one provider call, racing it against `cancel`.
pub(crate) async fn chat_cancellable(
    provider: &dyn LlmProvider,
    request: &ChatRequest,
    cancel: &CancellationToken,
) -> Result<ChatResponse, AgentError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AgentError::Cancelled),
        response = provider.chat(request) => response,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::Role;
    use crate::agent::provider::tests::ScriptedProvider;
    use crate::agent::tool::ToolCall;
    use crate::agent::tool::tests::EchoTool;
    use std::sync::Arc;

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: r#"{"query":"$BTC"}"#.to_string(),
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new(
            "test-model",
            vec![
                ChatMessage::system("You collect data."),
                ChatMessage::user("How is $BTC doing?"),
            ],
        )
    }

    const LIMITS: LoopLimits = LoopLimits {
        max_iterations: 6,
        max_attempts: 1,
    };

    #[tokio::test]
    async fn test_single_tool_round_then_stop() {
        let provider = ScriptedProvider::new(vec![
            ChatResponse::with_tool_calls(vec![call("call_1", "echo")]),
            ChatResponse::text("Done collecting."),
        ]);
        let echo = Arc::new(EchoTool::new("echo"));
        let tools = ToolSet::new().with_tool(echo.clone());
        let mut request = request();

        let outcome = agentic_loop(&provider, &mut request, &tools, LIMITS, &CancellationToken::new())
            .await
            .unwrap_or_else(|e| panic!("loop failed: {e}"));

        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.tool_calls, 1);
        assert_eq!(echo.calls(), 1);
        assert_eq!(provider.calls(), 2);
        // system + user + assistant(tool_calls) + tool + assistant text
        assert_eq!(request.messages.len(), 5);
        assert_eq!(request.messages[3].role, Role::Tool);
        assert_eq!(request.messages[4].content, "Done collecting.");
        assert_eq!(request.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_iteration_cap_is_not_an_error() {
        let provider = ScriptedProvider::new(
            (0..10)
                .map(|i| ChatResponse::with_tool_calls(vec![call(&format!("call_{i}"), "echo")]))
                .collect(),
        );
        let echo = Arc::new(EchoTool::new("echo"));
        let tools = ToolSet::new().with_tool(echo.clone());
        let limits = LoopLimits {
            max_iterations: 2,
            max_attempts: 1,
        };

        let outcome = agentic_loop(
            &provider,
            &mut request(),
            &tools,
            limits,
            &CancellationToken::new(),
        )
        .await
        .unwrap_or_else(|e| panic!("loop failed: {e}"));

        assert_eq!(outcome.iterations, 2);
        assert_eq!(echo.calls(), 2);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_tool_selected() {
        let provider = ScriptedProvider::new(vec![
            ChatResponse::text("I already know."),
            ChatResponse::text("Still no tools."),
        ]);
        let tools = ToolSet::new()
            .with_tool(Arc::new(EchoTool::new("search_twitter")))
            .with_tool(Arc::new(EchoTool::new("search_web")));
        let limits = LoopLimits {
            max_iterations: 3,
            max_attempts: 2,
        };

        let result = agentic_loop(
            &provider,
            &mut request(),
            &tools,
            limits,
            &CancellationToken::new(),
        )
        .await;

        let Err(AgentError::NoToolSelected { attempts, tools }) = result else {
            panic!("expected NoToolSelected");
        };
        assert_eq!(attempts, 2);
        assert_eq!(tools, "search_twitter, search_web");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_attempt_can_select_tool() {
        let provider = ScriptedProvider::new(vec![
            ChatResponse::text("Let me think."),
            ChatResponse::with_tool_calls(vec![call("call_1", "echo")]),
            ChatResponse::text("Enough."),
        ]);
        let tools = ToolSet::new().with_tool(Arc::new(EchoTool::new("echo")));
        let limits = LoopLimits {
            max_iterations: 3,
            max_attempts: 2,
        };

        let outcome = agentic_loop(
            &provider,
            &mut request(),
            &tools,
            limits,
            &CancellationToken::new(),
        )
        .await
        .unwrap_or_else(|e| panic!("loop failed: {e}"));

        assert_eq!(outcome.tool_calls, 1);
    }

    #[tokio::test]
    async fn test_tool_errors_are_fed_back() {
        let provider = ScriptedProvider::new(vec![
            ChatResponse::with_tool_calls(vec![
                ToolCall {
                    id: "call_1".to_string(),
                    name: "echo".to_string(),
                    arguments: r#"{"fail":true}"#.to_string(),
                },
                call("call_2", "missing_tool"),
            ]),
            ChatResponse::text("Partial data only."),
        ]);
        let tools = ToolSet::new().with_tool(Arc::new(EchoTool::new("echo")));
        let mut request = request();

        let outcome = agentic_loop(&provider, &mut request, &tools, LIMITS, &CancellationToken::new())
            .await
            .unwrap_or_else(|e| panic!("loop failed: {e}"));

        assert_eq!(outcome.tool_calls, 2);
        assert_eq!(outcome.failed_tool_calls, 2);
        assert!(request.messages[3].content.starts_with("Error:"));
        assert_eq!(request.messages[4].tool_call_id.as_deref(), Some("call_2"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = ScriptedProvider::failing(AgentError::ApiRequest {
            message: "invalid api key".to_string(),
            status: Some(401),
        });
        let tools = ToolSet::new().with_tool(Arc::new(EchoTool::new("echo")));

        let result = agentic_loop(
            &provider,
            &mut request(),
            &tools,
            LIMITS,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(AgentError::ApiRequest { status: Some(401), .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let provider = ScriptedProvider::new(vec![ChatResponse::text("unused")]);
        let tools = ToolSet::new().with_tool(Arc::new(EchoTool::new("echo")));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = agentic_loop(&provider, &mut request(), &tools, LIMITS, &cancel).await;

        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert_eq!(provider.calls(), 0);
    }
}
