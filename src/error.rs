//! Error types for gopher-client.
//!
//! Each layer has its own error enum: [`ClientError`] for the job API,
//! [`AgentError`] for the LLM agent and [`CommandError`] for the CLI.
//! [`Error`] wraps all of them for callers that do not care which layer
//! failed.

use std::time::Duration;

use thiserror::Error;

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Job API failure.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Agent failure.
    #[cfg(feature = "agent")]
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while talking to the job API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response (connection, DNS, TLS, body read).
    #[error("failed to do {method} request to {url}: {source}")]
    Transport {
        /// HTTP method of the failed request.
        method: &'static str,
        /// Target URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("job errored: status code {status} during call to {url}. Response body: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Target URL.
        url: String,
        /// Raw response body.
        body: String,
    },

    /// A 2xx response body did not match the expected shape.
    #[error("failed to unmarshal response from {url}: {source}. Response: '{body}'")]
    Decode {
        /// Target URL.
        url: String,
        /// Raw response body.
        body: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A request payload could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The server accepted the HTTP request but carried an inline error.
    #[error("job submission failed: {message}")]
    JobRejected {
        /// Inline error message from the response envelope.
        message: String,
    },

    /// An immediate (non-job) endpoint answered 2xx with an inline error.
    #[error("request to {url} errored: {message}")]
    Api {
        /// Target URL.
        url: String,
        /// Inline error message from the response body.
        message: String,
    },

    /// The job reached a terminal-failure status or reported an inline error.
    #[error("job {job_id} failed with status {status}: {message}")]
    JobFailed {
        /// Job identifier.
        job_id: String,
        /// Last observed status.
        status: String,
        /// Server error message.
        message: String,
    },

    /// No terminal status was observed before the deadline.
    #[error("job {job_id} timed out after {timeout:?}")]
    Timeout {
        /// Job identifier.
        job_id: String,
        /// Elapsed timeout.
        timeout: Duration,
    },

    /// The caller cancelled the wait.
    #[error("job {job_id} cancelled while waiting for completion")]
    Cancelled {
        /// Job identifier.
        job_id: String,
    },

    /// The caller cancelled before the server accepted the job.
    #[error("{kind} job submission cancelled")]
    SubmitCancelled {
        /// Job type of the abandoned submission.
        kind: String,
    },

    /// Invalid client configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl ClientError {
    /// Returns `true` for a poll deadline or an HTTP request timeout.
    ///
    /// A timed-out job may still finish later.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` when the submission or the wait was cancelled by the
    /// caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::SubmitCancelled { .. })
    }
}

/// Errors from the LLM agent.
#[cfg(feature = "agent")]
#[derive(Error, Debug)]
pub enum AgentError {
    /// No API key was configured for the LLM provider.
    #[error("must supply an OPENAI_TOKEN (or OPENAI_API_KEY)")]
    ApiKeyMissing,

    /// The LLM API call failed.
    #[error("LLM API request failed: {message}")]
    ApiRequest {
        /// Error description.
        message: String,
        /// HTTP status, if known.
        status: Option<u16>,
    },

    /// The model never requested a tool.
    #[error(
        "LLM did not select any tools after {attempts} attempt(s). \
         This task requires using {tools} to gather data"
    )]
    NoToolSelected {
        /// Selection attempts made.
        attempts: usize,
        /// Comma-separated names of the available tools.
        tools: String,
    },

    /// Unknown provider name in configuration.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// Provider name.
        name: String,
    },

    /// A tool failed to run.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Error description.
        message: String,
    },

    /// Structured extraction from the final answer failed.
    #[error("structured extraction failed: {message}")]
    Extraction {
        /// Error description.
        message: String,
    },

    /// The caller cancelled the query.
    #[error("agent query cancelled")]
    Cancelled,

    /// Invalid agent configuration.
    #[error("invalid agent configuration: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// A job API failure that escaped a tool.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Errors from CLI command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command failed.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Invalid command-line input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output could not be rendered.
    #[error("output format error: {0}")]
    OutputFormat(String),
}
