//! Client configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables
//! (optionally seeded from a `.env` file) → defaults. Build it once at startup
//! and hand it to [`Client::new`](crate::client::Client::new).

use std::time::Duration;

use tracing::debug;

use crate::error::ClientError;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://data.gopher-ai.com/api";
/// Default overall timeout for waiting on a job.
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default interval between job status polls.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Environment variable for the API base URL.
pub const ENV_BASE_URL: &str = "GOPHER_CLIENT_URL";
/// Environment variable for the bearer token.
pub const ENV_TOKEN: &str = "GOPHER_CLIENT_TOKEN";
/// Environment variable for the job timeout.
pub const ENV_TIMEOUT: &str = "GOPHER_CLIENT_TIMEOUT";
/// Environment variable for the poll interval.
pub const ENV_POLL_INTERVAL: &str = "GOPHER_CLIENT_POLL_INTERVAL";

/// Configuration for the job API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Bearer token. `None` sends no `Authorization` header.
    pub token: Option<String>,
    /// Overall timeout for waiting on a single job (and for HTTP requests).
    pub timeout: Duration,
    /// Interval between job status polls.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl ClientConfig {
    /// Creates a new builder for `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Loads configuration from `.env` (if present) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a duration variable cannot be parsed.
    pub fn from_env() -> Result<Self, ClientError> {
        load_dotenv();
        Self::builder().from_env()?.build()
    }
}

/// Loads a `.env` file from the current directory or its parents.
///
/// A missing file is not an error; existing environment variables win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env file"),
        Err(e) => debug!(error = %e, "no .env file loaded, using process environment"),
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    poll_interval: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Populates unset fields from environment variables.
    ///
    /// A variable set to the empty string is honored as-is for the base URL
    /// and means "no token" for the token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a duration variable cannot be parsed.
    pub fn from_env(mut self) -> Result<Self, ClientError> {
        if self.base_url.is_none() {
            self.base_url = std::env::var(ENV_BASE_URL).ok();
        }
        if self.token.is_none() {
            self.token = std::env::var(ENV_TOKEN).ok();
        }
        if self.timeout.is_none()
            && let Ok(raw) = std::env::var(ENV_TIMEOUT)
        {
            self.timeout = Some(parse_duration(&raw).map_err(|message| ClientError::Config {
                message: format!("{ENV_TIMEOUT}: {message}"),
            })?);
        }
        if self.poll_interval.is_none()
            && let Ok(raw) = std::env::var(ENV_POLL_INTERVAL)
        {
            self.poll_interval =
                Some(parse_duration(&raw).map_err(|message| ClientError::Config {
                    message: format!("{ENV_POLL_INTERVAL}: {message}"),
                })?);
        }
        Ok(self)
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the job timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, duration: Duration) -> Self {
        self.poll_interval = Some(duration);
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for a zero timeout or poll interval.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let poll_interval = self
            .poll_interval
            .unwrap_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));

        if timeout.is_zero() {
            return Err(ClientError::Config {
                message: "timeout must be greater than zero".to_string(),
            });
        }
        if poll_interval.is_zero() {
            return Err(ClientError::Config {
                message: "poll interval must be greater than zero".to_string(),
            });
        }

        Ok(ClientConfig {
            base_url: self
                .base_url
                .map_or_else(|| DEFAULT_BASE_URL.to_string(), |u| u.trim_end_matches('/').to_string()),
            token: self.token.filter(|t| !t.is_empty()),
            timeout,
            poll_interval,
        })
    }
}

/// Parses a human-friendly duration: `500ms`, `60s`, `2m`, `1h`, or bare seconds.
///
/// # Errors
///
/// Returns a description of the problem when the input is not understood.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{raw}'"))?;

    match unit.trim() {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(3600))),
        other => Err(format!("unknown duration unit '{other}' in '{raw}'")),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Serializes tests that mutate process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear_env() {
        // SAFETY: callers hold ENV_LOCK, so no other test touches the environment.
        unsafe {
            std::env::remove_var(ENV_BASE_URL);
            std::env::remove_var(ENV_TOKEN);
            std::env::remove_var(ENV_TIMEOUT);
            std::env::remove_var(ENV_POLL_INTERVAL);
        }
    }

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder()
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com/")
            .token("test-token-123")
            .timeout(Duration::from_secs(30))
            .poll_interval(Duration::from_millis(250))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.token.as_deref(), Some("test-token-123"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_builder_empty_token_means_no_auth() {
        let config = ClientConfig::builder()
            .token("")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = ClientConfig::builder().timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(ClientError::Config { .. })));
    }

    #[test]
    fn test_from_env_values() {
        let _guard = env_lock();
        clear_env();
        // SAFETY: guarded by ENV_LOCK.
        unsafe {
            std::env::set_var(ENV_BASE_URL, "https://test.example.com");
            std::env::set_var(ENV_TOKEN, "test-token-456");
            std::env::set_var(ENV_TIMEOUT, "2m");
        }

        let config = ClientConfig::builder()
            .from_env()
            .and_then(ClientConfigBuilder::build)
            .unwrap_or_else(|e| unreachable!("{e}"));
        clear_env();

        assert_eq!(config.base_url, "https://test.example.com");
        assert_eq!(config.token.as_deref(), Some("test-token-456"));
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_from_env_empty_base_url_is_kept() {
        let _guard = env_lock();
        clear_env();
        // SAFETY: guarded by ENV_LOCK.
        unsafe {
            std::env::set_var(ENV_BASE_URL, "");
        }

        let config = ClientConfig::builder()
            .from_env()
            .and_then(ClientConfigBuilder::build)
            .unwrap_or_else(|e| unreachable!("{e}"));
        clear_env();

        assert_eq!(config.base_url, "");
    }

    #[test]
    fn test_explicit_value_beats_env() {
        let _guard = env_lock();
        clear_env();
        // SAFETY: guarded by ENV_LOCK.
        unsafe {
            std::env::set_var(ENV_BASE_URL, "https://env.example.com");
        }

        let config = ClientConfig::builder()
            .base_url("https://explicit.example.com")
            .from_env()
            .and_then(ClientConfigBuilder::build)
            .unwrap_or_else(|e| unreachable!("{e}"));
        clear_env();

        assert_eq!(config.base_url, "https://explicit.example.com");
    }

    #[test]
    fn test_from_env_invalid_timeout() {
        let _guard = env_lock();
        clear_env();
        // SAFETY: guarded by ENV_LOCK.
        unsafe {
            std::env::set_var(ENV_TIMEOUT, "soon");
        }

        let result = ClientConfig::builder().from_env();
        clear_env();

        assert!(matches!(result, Err(ClientError::Config { .. })));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("60s"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("45"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ten").is_err());
        assert!(parse_duration("5d").is_err());
    }
}
