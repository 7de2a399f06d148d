//! Immediate LLM-backed endpoints: analysis, search-term extraction and
//! query contextualization. These answer synchronously; no job is created.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Client;
use crate::error::ClientError;

/// Model used by `/v1/analysis` when none is given.
pub const DEFAULT_ANALYSIS_MODEL: &str = "openai/gpt-4o-mini";
/// Default number of extracted search terms.
pub const DEFAULT_MAX_TERMS: u32 = 4;
/// Default number of history items used for contextualization.
pub const DEFAULT_MAX_HISTORY_ITEMS: u32 = 5;

/// One earlier query in a chat session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    /// The earlier query.
    pub query: String,
    /// When it was asked.
    pub timestamp: String,
}

/// Request body for `/v1/analysis`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Texts to analyze; the server still calls the field `tweets`.
    #[serde(rename = "tweets")]
    pub data: Vec<String>,
    /// Analysis prompt.
    pub prompt: String,
    /// Model id; empty means [`DEFAULT_ANALYSIS_MODEL`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    /// Whether the request comes from the app.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub app: bool,
    /// Earlier queries for context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chat_history: Vec<ChatHistoryItem>,
    /// Query being analyzed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_query: String,
}

impl AnalysisRequest {
    /// Creates a request with default model and no history.
    #[must_use]
    pub fn new(data: Vec<String>, prompt: impl Into<String>) -> Self {
        Self {
            data,
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Selects a model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Response from `/v1/analysis`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Final analysis.
    #[serde(default)]
    pub analysis: String,
    /// Model reasoning.
    #[serde(default)]
    pub reasoning: String,
    /// Model that answered.
    #[serde(default)]
    pub model_used: String,
    /// Tokens consumed.
    #[serde(default)]
    pub tokens_used: u64,
    /// Request identifier.
    #[serde(default)]
    pub job_uuid: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionRequest<'a> {
    user_input: &'a str,
    max_terms: u32,
}

/// Response from `/v1/extraction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    /// Optimized search term.
    #[serde(default)]
    pub search_term: String,
    /// Model reasoning.
    #[serde(default)]
    pub thinking: String,
    /// Request identifier.
    #[serde(default)]
    pub uuid: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextualizeRequest<'a> {
    current_query: &'a str,
    chat_history: &'a [ChatHistoryItem],
    max_history_items: u32,
}

/// Response from `/v1/contextualize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualizeResponse {
    /// Query rewritten with context.
    #[serde(default)]
    pub contextualized_query: String,
    /// Query as asked.
    #[serde(default)]
    pub original_query: String,
    /// Whether history changed the query.
    #[serde(default)]
    pub used_context: bool,
    /// Explanation.
    #[serde(default)]
    pub reasoning: String,
}

impl Client {
    /// Analyzes texts with an LLM. An empty model selects
    /// [`DEFAULT_ANALYSIS_MODEL`].
    pub async fn analyze_data(
        &self,
        mut request: AnalysisRequest,
    ) -> Result<AnalysisResponse, ClientError> {
        if request.model.is_empty() {
            request.model = DEFAULT_ANALYSIS_MODEL.to_string();
        }
        debug!(items = request.data.len(), model = %request.model, "analyzing data");
        self.post_json("/v1/analysis", &request).await
    }

    /// Analyzes texts with the default model and no history.
    pub async fn analyze_data_simple(
        &self,
        data: Vec<String>,
        prompt: &str,
    ) -> Result<AnalysisResponse, ClientError> {
        self.analyze_data(AnalysisRequest::new(data, prompt)).await
    }

    /// Lists models accepted by [`Client::analyze_data`].
    pub async fn available_models(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("/v1/analysis").await
    }

    /// Extracts an optimized search term from free text.
    /// `max_terms` outside `1..=6` becomes [`DEFAULT_MAX_TERMS`].
    pub async fn extract_search_terms(
        &self,
        user_input: &str,
        max_terms: u32,
    ) -> Result<ExtractionResponse, ClientError> {
        let max_terms = if (1..=6).contains(&max_terms) {
            max_terms
        } else {
            DEFAULT_MAX_TERMS
        };
        self.post_json(
            "/v1/extraction",
            &ExtractionRequest {
                user_input,
                max_terms,
            },
        )
        .await
    }

    /// Rewrites `current_query` using earlier queries.
    /// `max_history_items` outside `1..=10` becomes [`DEFAULT_MAX_HISTORY_ITEMS`].
    pub async fn contextualize_query(
        &self,
        current_query: &str,
        chat_history: &[ChatHistoryItem],
        max_history_items: u32,
    ) -> Result<ContextualizeResponse, ClientError> {
        let max_history_items = if (1..=10).contains(&max_history_items) {
            max_history_items
        } else {
            DEFAULT_MAX_HISTORY_ITEMS
        };
        self.post_json(
            "/v1/contextualize",
            &ContextualizeRequest {
                current_query,
                chat_history,
                max_history_items,
            },
        )
        .await
    }
}
