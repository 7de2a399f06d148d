//! Query orchestration: tool loop, final answer, structured extraction.
//!
//! [`Agent::query`] composes the prompt, lets the model drive the
//! data collection tools for a bounded number of iterations, asks once more
//! for a JSON answer, then extracts it into a typed report. Only provider
//! failures, cancellation and a model that never selects a tool fail the
//! query; an extraction failure degrades to an empty report.

use std::sync::Arc;
use std::time::Instant;

use schemars::JsonSchema;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::agentic_loop::{LoopLimits, agentic_loop, chat_cancellable};
use super::config::AgentConfig;
use super::extraction::Extractor;
use super::message::{ChatMessage, ChatRequest, TokenUsage};
use super::prompt::{PromptSet, build_query_prompt};
use super::provider::LlmProvider;
use super::providers::create_provider;
use super::tool::ToolSet;
use super::tools::data_collection_tools;
use crate::client::Client;
use crate::error::AgentError;

/// Market sentiment per asset, the default structured output.
///
/// Decoding is lenient: unknown keys are ignored, scores are rounded and
/// clamped, and an asset entry that still fails to decode is dropped on its
/// own instead of failing the whole report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(extend("additionalProperties" = false))]
pub struct SentimentReport {
    /// Track the market sentiment of assets, such as Bitcoin, Ethereum, and
    /// other cryptocurrencies.
    #[serde(default, deserialize_with = "deserialize_assets")]
    pub assets: Vec<AssetSentiment>,
}

/// Sentiment for one asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(extend("additionalProperties" = false))]
pub struct AssetSentiment {
    /// Asset name.
    pub asset: String,
    /// Brief reasoning about the sentiment of the asset.
    pub reasoning: String,
    /// Numeric sentiment score from 0-100. Scale: 0 = most bearish,
    /// 50 = neutral, 100 = most bullish. Each asset should have a distinct
    /// score based on its unique data and sentiment signals.
    #[schemars(range(min = 0, max = 100))]
    #[serde(deserialize_with = "deserialize_score")]
    pub sentiment: u8,
}

fn deserialize_assets<'de, D>(deserializer: D) -> Result<Vec<AssetSentiment>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        warn!("sentiment report assets is not an array, ignoring it");
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match AssetSentiment::deserialize(item) {
            Ok(asset) => Some(asset),
            Err(e) => {
                warn!(index, error = %e, "dropping malformed asset entry");
                None
            }
        })
        .collect())
}

/// Accepts any JSON number or numeric string, rounded into `0..=100`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let score = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|score| score.is_finite())
    .ok_or_else(|| D::Error::custom(format!("sentiment must be a number, got {value}")))?;

    Ok(score.round().clamp(0.0, 100.0) as u8)
}

/// JSON schema for `T`.
#[must_use]
pub fn schema_for<T: JsonSchema>() -> Value {
    schemars::schema_for!(T).to_value()
}

/// Per-query overrides. Unset fields use the loaded prompts and the
/// agent configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    schema: Option<Value>,
    instructions: Option<String>,
    prompt_suffix: Option<String>,
    final_prompt: Option<String>,
    max_iterations: Option<usize>,
    max_attempts: Option<usize>,
}

impl QueryOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the output schema.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Replaces the query instructions. An empty string drops them.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Replaces the prompt suffix. An empty string drops it.
    #[must_use]
    pub fn with_prompt_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.prompt_suffix = Some(suffix.into());
        self
    }

    /// Replaces the final answer prompt.
    #[must_use]
    pub fn with_final_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.final_prompt = Some(prompt.into());
        self
    }

    /// Overrides the iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Overrides the per-iteration attempt cap.
    #[must_use]
    pub const fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = Some(n);
        self
    }
}

/// Everything a query produced.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome<T> {
    /// Extracted output; `T::default()` when extraction failed.
    pub output: T,
    /// Whether extraction succeeded.
    pub extracted: bool,
    /// The model's free-form final answer.
    pub answer: String,
    /// Tool loop iterations run.
    pub iterations: usize,
    /// Tool calls executed.
    pub tool_calls: usize,
    /// Tool calls that returned errors.
    pub failed_tool_calls: usize,
    /// Summed usage across all model calls.
    pub usage: TokenUsage,
    /// Wall time.
    pub elapsed_ms: u64,
}

/// LLM agent over the data collection tools.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: ToolSet,
    config: AgentConfig,
    prompts: PromptSet,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider.name())
            .field("tools", &self.tools)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Creates an agent whose tools submit jobs through `client`.
    ///
    /// Prompt templates load from [`AgentConfig::prompt_dir`], falling back
    /// to the compiled-in defaults.
    #[must_use]
    pub fn new(client: &Client, provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let tools = data_collection_tools(client, config.max_tool_args_bytes);
        Self::with_tools(provider, tools, config)
    }

    /// Creates an agent over an explicit tool set.
    #[must_use]
    pub fn with_tools(provider: Arc<dyn LlmProvider>, tools: ToolSet, config: AgentConfig) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self {
            provider,
            tools,
            config,
            prompts,
        }
    }

    /// Replaces the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Builds the client, configuration and provider from the environment.
    ///
    /// # Errors
    ///
    /// Client configuration errors, [`AgentError::ApiKeyMissing`] and
    /// [`AgentError::UnsupportedProvider`].
    pub fn from_env() -> Result<Self, AgentError> {
        let client = Client::from_env()?;
        let config = AgentConfig::from_env()?;
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config)?);
        Ok(Self::new(&client, provider, config))
    }

    /// The agent configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs `query` and extracts a [`SentimentReport`].
    ///
    /// # Errors
    ///
    /// See [`Agent::run`].
    pub async fn query(
        &self,
        query: &str,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<SentimentReport, AgentError> {
        self.query_as(query, options, cancel).await
    }

    /// Runs `query` and extracts a caller-declared `T`.
    ///
    /// The schema defaults to the one derived from `T`.
    ///
    /// # Errors
    ///
    /// See [`Agent::run`].
    pub async fn query_as<T>(
        &self,
        query: &str,
        options: &QueryOptions,
        cancel: &CancellationToken,
    ) -> Result<T, AgentError>
    where
        T: DeserializeOwned + JsonSchema + Default,
    {
        let schema = options.schema.clone().unwrap_or_else(schema_for::<T>);
        self.run(query, options, &schema, cancel)
            .await
            .map(|outcome| outcome.output)
    }

    /// Runs the full pipeline and reports what happened.
    ///
    /// # Errors
    ///
    /// [`AgentError::NoToolSelected`] when the model never calls a tool,
    /// [`AgentError::Cancelled`] on cancellation and provider errors.
    /// Extraction failures are logged and yield `T::default()`.
    pub async fn run<T>(
        &self,
        query: &str,
        options: &QueryOptions,
        schema: &Value,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<T>, AgentError>
    where
        T: DeserializeOwned + Default,
    {
        let start = Instant::now();
        let prompt = build_query_prompt(
            query,
            &self.prompts.data_collection,
            options
                .instructions
                .as_deref()
                .unwrap_or(&self.prompts.query_instructions),
            options
                .prompt_suffix
                .as_deref()
                .unwrap_or(&self.prompts.suffix),
        );
        let limits = LoopLimits {
            max_iterations: options.max_iterations.unwrap_or(self.config.max_iterations),
            max_attempts: options.max_attempts.unwrap_or(self.config.max_attempts),
        };
        info!(
            model = %self.config.model,
            tools = ?self.tools.names(),
            max_iterations = limits.max_iterations,
            "starting agent query"
        );

        let mut request = ChatRequest::new(&self.config.model, vec![ChatMessage::user(prompt)]);
        let provider = self.provider.as_ref();
        let loop_outcome = agentic_loop(provider, &mut request, &self.tools, limits, cancel)
            .await
            .inspect_err(|e| {
                if matches!(e, AgentError::NoToolSelected { .. }) {
                    warn!(error = %e, "model did not select any tools");
                }
            })?;
        let mut usage = loop_outcome.usage;

        let final_prompt = options
            .final_prompt
            .as_deref()
            .unwrap_or(&self.prompts.final_prompt);
        request.messages.push(ChatMessage::user(final_prompt));
        request.tools.clear();
        let answer = chat_cancellable(provider, &request, cancel).await?;
        usage.accumulate(answer.usage);

        let extractor = Extractor::new(
            provider,
            &self.config.model,
            &self.prompts.extraction,
            self.config.extraction_timeout,
        );
        let (output, extracted) = match extractor.extract::<T>(schema, &answer.content, cancel).await
        {
            Ok((output, extraction_usage)) => {
                usage.accumulate(extraction_usage);
                (output, true)
            }
            Err(AgentError::Cancelled) => return Err(AgentError::Cancelled),
            Err(e) => {
                error!(error = %e, "extraction error");
                (T::default(), false)
            }
        };

        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            iterations = loop_outcome.iterations,
            tool_calls = loop_outcome.tool_calls,
            extracted,
            total_tokens = usage.total_tokens,
            elapsed_ms,
            "agent query finished"
        );

        Ok(QueryOutcome {
            output,
            extracted,
            answer: answer.content,
            iterations: loop_outcome.iterations,
            tool_calls: loop_outcome.tool_calls,
            failed_tool_calls: loop_outcome.failed_tool_calls,
            usage,
            elapsed_ms,
        })
    }
}
