//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default LLM provider.
pub const DEFAULT_PROVIDER: &str = "openai";
/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-5-nano";
/// Default `OpenAI` API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default tool-calling iterations.
const DEFAULT_MAX_ITERATIONS: usize = 6;
/// Default LLM calls per iteration while waiting for a tool selection.
const DEFAULT_MAX_ATTEMPTS: usize = 1;
/// Default deadline for structured extraction.
const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 120;
/// Tool arguments larger than this are rejected without running the tool.
const DEFAULT_MAX_TOOL_ARGS_BYTES: usize = 64 * 1024;

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name.
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Model used for every call.
    pub model: String,
    /// Maximum tool-calling iterations.
    pub max_iterations: usize,
    /// Maximum LLM calls per iteration before giving up on tool selection.
    pub max_attempts: usize,
    /// Deadline for the structured extraction call.
    pub extraction_timeout: Duration,
    /// Maximum size of one tool call's JSON arguments.
    pub max_tool_args_bytes: usize,
    /// Maximum completion tokens per call; provider default when unset.
    pub max_tokens: Option<u32>,
    /// Directory of prompt template overrides.
    ///
    /// Missing files fall back to the compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Loads `.env` (if present) and reads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        crate::config::load_dotenv();
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    max_iterations: Option<usize>,
    max_attempts: Option<usize>,
    extraction_timeout: Option<Duration>,
    max_tool_args_bytes: Option<usize>,
    max_tokens: Option<u32>,
    prompt_dir: Option<PathBuf>,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = non_empty_var("GOPHER_AGENT_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key =
                non_empty_var("OPENAI_TOKEN").or_else(|| non_empty_var("OPENAI_API_KEY"));
        }
        if self.base_url.is_none() {
            self.base_url = non_empty_var("OPENAI_BASE_URL");
        }
        if self.model.is_none() {
            self.model = non_empty_var("GOPHER_AGENT_MODEL");
        }
        if self.max_iterations.is_none() {
            self.max_iterations =
                non_empty_var("GOPHER_AGENT_MAX_ITERATIONS").and_then(|v| v.parse().ok());
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = non_empty_var("GOPHER_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub const fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the per-iteration attempt cap.
    #[must_use]
    pub const fn max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = Some(n);
        self
    }

    /// Sets the extraction deadline.
    #[must_use]
    pub const fn extraction_timeout(mut self, duration: Duration) -> Self {
        self.extraction_timeout = Some(duration);
        self
    }

    /// Sets the tool argument size limit.
    #[must_use]
    pub const fn max_tool_args_bytes(mut self, n: usize) -> Self {
        self.max_tool_args_bytes = Some(n);
        self
    }

    /// Sets the completion token cap.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set and
    /// [`AgentError::Config`] for a zero iteration or attempt cap.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        let max_iterations = self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_iterations == 0 || max_attempts == 0 {
            return Err(AgentError::Config {
                message: "iteration and attempt caps must be at least 1".to_string(),
            });
        }

        Ok(AgentConfig {
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_iterations,
            max_attempts,
            extraction_timeout: self
                .extraction_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS)),
            max_tool_args_bytes: self
                .max_tool_args_bytes
                .unwrap_or(DEFAULT_MAX_TOOL_ARGS_BYTES),
            max_tokens: self.max_tokens,
            prompt_dir: self.prompt_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::env_lock;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-5-nano");
        assert_eq!(config.max_iterations, 6);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.extraction_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_builder_missing_api_key() {
        assert!(matches!(
            AgentConfig::builder().build(),
            Err(AgentError::ApiKeyMissing)
        ));
        assert!(matches!(
            AgentConfig::builder().api_key("").build(),
            Err(AgentError::ApiKeyMissing)
        ));
    }

    #[test]
    fn test_builder_rejects_zero_caps() {
        let result = AgentConfig::builder()
            .api_key("k")
            .max_iterations(0)
            .build();
        assert!(matches!(result, Err(AgentError::Config { .. })));
    }

    #[test]
    fn test_from_env_prefers_openai_token() {
        let _guard = env_lock();
        // SAFETY: guarded by the shared env lock.
        unsafe {
            std::env::set_var("OPENAI_TOKEN", "token-a");
            std::env::set_var("OPENAI_API_KEY", "token-b");
            std::env::set_var("GOPHER_AGENT_MODEL", "gpt-test");
        }

        let config = AgentConfig::builder()
            .from_env()
            .build()
            .unwrap_or_else(|_| unreachable!());

        // SAFETY: guarded by the shared env lock.
        unsafe {
            std::env::remove_var("OPENAI_TOKEN");
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("GOPHER_AGENT_MODEL");
        }

        assert_eq!(config.api_key, "token-a");
        assert_eq!(config.model, "gpt-test");
    }

    #[test]
    fn test_from_env_falls_back_to_api_key() {
        let _guard = env_lock();
        // SAFETY: guarded by the shared env lock.
        unsafe {
            std::env::remove_var("OPENAI_TOKEN");
            std::env::set_var("OPENAI_API_KEY", "token-b");
        }

        let config = AgentConfig::builder().from_env().build();

        // SAFETY: guarded by the shared env lock.
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }

        assert_eq!(config.map(|c| c.api_key).ok().as_deref(), Some("token-b"));
    }
}
