//! Structured extraction of the model's final answer.
//!
//! One JSON-mode call turns the free-form answer into an object matching the
//! caller's schema. The call runs under its own deadline, nested inside the
//! caller's cancellation.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::agentic_loop::chat_cancellable;
use super::message::{ChatMessage, ChatRequest, TokenUsage};
use super::prompt::build_extraction_prompt;
use super::provider::LlmProvider;
use crate::error::AgentError;

/// Runs extraction calls against one provider and model.
pub struct Extractor<'a> {
    provider: &'a dyn LlmProvider,
    model: &'a str,
    system_prompt: &'a str,
    timeout: Duration,
}

impl<'a> Extractor<'a> {
    /// Creates an extractor.
    #[must_use]
    pub const fn new(
        provider: &'a dyn LlmProvider,
        model: &'a str,
        system_prompt: &'a str,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model,
            system_prompt,
            timeout,
        }
    }

    /// Extracts a `T` from `answer`, guided by `schema`.
    ///
    /// # Errors
    ///
    /// [`AgentError::Extraction`] when the deadline passes or the reply does
    /// not decode into `T`, [`AgentError::Cancelled`] on cancellation, and
    /// provider errors.
    pub async fn extract<T: DeserializeOwned>(
        &self,
        schema: &Value,
        answer: &str,
        cancel: &CancellationToken,
    ) -> Result<(T, TokenUsage), AgentError> {
        let schema_text =
            serde_json::to_string_pretty(schema).map_err(|e| AgentError::Extraction {
                message: format!("schema is not serializable: {e}"),
            })?;

        let request = ChatRequest::new(
            self.model,
            vec![
                ChatMessage::system(self.system_prompt),
                ChatMessage::user(build_extraction_prompt(&schema_text, answer)),
            ],
        )
        .json_schema(schema.clone());

        let response = tokio::time::timeout(
            self.timeout,
            chat_cancellable(self.provider, &request, cancel),
        )
        .await
        .map_err(|_| AgentError::Extraction {
            message: format!("extraction timed out after {}s", self.timeout.as_secs()),
        })??;

        debug!(bytes = response.content.len(), "extraction response received");
        let value = parse_json(&response.content)?;
        Ok((value, response.usage))
    }
}

/// Decodes a JSON object from model output, tolerating code fences and
/// surrounding prose.
///
/// # Errors
///
/// [`AgentError::Extraction`] with a short preview of the content.
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, AgentError> {
    let trimmed = content.trim();
    let json_str = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    let first_err = match serde_json::from_str::<T>(json_str) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // Embedded object: first '{' to last '}'.
    if let (Some(start), Some(end)) = (json_str.find('{'), json_str.rfind('}'))
        && start < end
        && let Ok(value) = serde_json::from_str::<T>(&json_str[start..=end])
    {
        return Ok(value);
    }

    let preview: String = json_str.chars().take(200).collect();
    Err(AgentError::Extraction {
        message: format!(
            "failed to parse structured output: {first_err}. \
             Response length: {} bytes, preview: {preview:?}",
            json_str.len()
        ),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::ChatResponse;
    use crate::agent::provider::tests::ScriptedProvider;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Asset {
        asset: String,
        sentiment: u8,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Report {
        assets: Vec<Asset>,
    }

    struct StalledProvider;

    #[async_trait]
    impl LlmProvider for StalledProvider {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ChatResponse::text("{}"))
        }
    }

    #[test]
    fn test_parse_plain_fenced_and_embedded() {
        let plain: Report = parse_json(r#"{"assets":[{"asset":"BTC","sentiment":70}]}"#)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(plain.assets[0].sentiment, 70);

        let fenced: Report = parse_json("```json\n{\"assets\":[]}\n```")
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(fenced.assets.is_empty());

        let embedded: Report =
            parse_json("Here you go: {\"assets\":[{\"asset\":\"ETH\",\"sentiment\":40}]} Thanks!")
                .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(embedded.assets[0].asset, "ETH");
    }

    #[test]
    fn test_parse_garbage_is_extraction_error() {
        let result = parse_json::<Report>("the market looks bullish");
        let Err(AgentError::Extraction { message }) = result else {
            panic!("expected an extraction error");
        };
        assert!(message.contains("preview"));
    }

    #[tokio::test]
    async fn test_extract_sends_schema_in_json_mode() {
        let provider = ScriptedProvider::new(vec![ChatResponse::text(
            r#"{"assets":[{"asset":"SOL","sentiment":55}]}"#,
        )]);
        let extractor = Extractor::new(&provider, "gpt-5-nano", "extract", Duration::from_secs(5));
        let schema = json!({"type": "object", "required": ["assets"]});

        let (report, _usage): (Report, _) = extractor
            .extract(&schema, "SOL looks neutral-bullish", &CancellationToken::new())
            .await
            .unwrap_or_else(|e| panic!("extract failed: {e}"));

        assert_eq!(report.assets[0].asset, "SOL");
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_mode);
        assert_eq!(requests[0].response_schema.as_ref(), Some(&schema));
        assert!(requests[0].tools.is_empty());
        assert!(requests[0].messages[1].content.contains("\"required\""));
        assert!(requests[0].messages[1].content.contains("SOL looks neutral-bullish"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_deadline() {
        let extractor =
            Extractor::new(&StalledProvider, "gpt-5-nano", "extract", Duration::from_secs(120));

        let result = extractor
            .extract::<Report>(&json!({}), "answer", &CancellationToken::new())
            .await;

        let Err(AgentError::Extraction { message }) = result else {
            panic!("expected an extraction timeout");
        };
        assert!(message.contains("120s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_cancelled() {
        let extractor =
            Extractor::new(&StalledProvider, "gpt-5-nano", "extract", Duration::from_secs(120));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = extractor
            .extract::<Report>(&json!({}), "answer", &cancel)
            .await;

        assert!(matches!(result, Err(AgentError::Cancelled)));
    }
}
