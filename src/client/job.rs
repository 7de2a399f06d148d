//! Job wire types.
//!
//! Every asynchronous job is submitted as one envelope:
//!
//! ```json
//! {"type": "twitter", "arguments": {"type": "searchbyquery", "query": "..."}}
//! ```
//!
//! The outer `type` names the platform, the inner `type` the capability.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Platform a job runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Twitter / X.
    Twitter,
    /// Generic web pages.
    Web,
    /// Reddit.
    Reddit,
    /// `LinkedIn`.
    Linkedin,
    /// `TikTok`.
    Tiktok,
}

impl JobType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Web => "web",
            Self::Reddit => "reddit",
            Self::Linkedin => "linkedin",
            Self::Tiktok => "tiktok",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of job, one per argument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Twitter query search.
    TwitterSearch,
    /// Web page scrape.
    WebScrape,
    /// Reddit posts/users/communities search or URL scrape.
    RedditSearch,
    /// `LinkedIn` profile search.
    LinkedinSearch,
    /// `TikTok` query search.
    TiktokSearch,
    /// `TikTok` trending feed.
    TiktokTrending,
    /// `TikTok` video transcription.
    TiktokTranscription,
}

impl JobKind {
    /// Platform this kind is submitted under.
    #[must_use]
    pub const fn job_type(self) -> JobType {
        match self {
            Self::TwitterSearch => JobType::Twitter,
            Self::WebScrape => JobType::Web,
            Self::RedditSearch => JobType::Reddit,
            Self::LinkedinSearch => JobType::Linkedin,
            Self::TiktokSearch | Self::TiktokTrending | Self::TiktokTranscription => {
                JobType::Tiktok
            }
        }
    }

    /// Human-readable kind name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TwitterSearch => "twitter-search",
            Self::WebScrape => "web-scrape",
            Self::RedditSearch => "reddit-search",
            Self::LinkedinSearch => "linkedin-search",
            Self::TiktokSearch => "tiktok-search",
            Self::TiktokTrending => "tiktok-trending",
            Self::TiktokTranscription => "tiktok-transcription",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, source-specific job arguments.
///
/// Implementors serialize to a JSON object *without* the capability tag;
/// [`JobRequest::new`] inserts it.
pub trait JobArguments: Serialize + Send + Sync {
    /// Job kind these arguments belong to.
    fn kind(&self) -> JobKind;

    /// Capability tag written as `arguments.type`.
    fn capability(&self) -> &'static str;
}

/// Wire job request envelope. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    /// Platform.
    #[serde(rename = "type")]
    pub job_type: JobType,
    /// Capability-tagged argument object.
    pub arguments: Value,
}

impl JobRequest {
    /// Builds the envelope from typed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] if the arguments cannot be serialized
    /// and [`ClientError::Config`] if they do not serialize to an object.
    pub fn new<A: JobArguments + ?Sized>(args: &A) -> Result<Self, ClientError> {
        let mut arguments = serde_json::to_value(args)?;
        let Some(map) = arguments.as_object_mut() else {
            return Err(ClientError::Config {
                message: format!("{} arguments must serialize to a JSON object", args.kind()),
            });
        };
        map.insert(
            "type".to_string(),
            Value::String(args.capability().to_string()),
        );

        Ok(Self {
            job_type: args.kind().job_type(),
            arguments,
        })
    }
}

/// Server response to a job submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmission {
    /// Server-assigned job id.
    #[serde(default)]
    pub uuid: String,
    /// Inline error; empty when the job was accepted.
    #[serde(default)]
    pub error: String,
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Accepted, waiting for a worker.
    #[serde(rename = "in queue", alias = "queued")]
    Queued,
    /// A worker is running the job.
    #[serde(rename = "in progress", alias = "in-progress")]
    InProgress,
    /// Finished, results stored.
    #[serde(rename = "done")]
    Done,
    /// Finished, results available but not persisted.
    #[serde(rename = "done(not saved)", alias = "done-not-saved")]
    DoneNotSaved,
    /// Failed.
    #[serde(rename = "error")]
    Error,
    /// Failed after retrying.
    #[serde(rename = "error(retrying)", alias = "retry-error")]
    RetryError,
    /// Any status this client does not know; treated as still running.
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "in queue",
            Self::InProgress => "in progress",
            Self::Done => "done",
            Self::DoneNotSaved => "done(not saved)",
            Self::Error => "error",
            Self::RetryError => "error(retrying)",
            Self::Unknown => "unknown",
        }
    }

    /// `done` or `done(not saved)`.
    #[must_use]
    pub const fn is_success_terminal(self) -> bool {
        matches!(self, Self::Done | Self::DoneNotSaved)
    }

    /// `error` or `error(retrying)`.
    #[must_use]
    pub const fn is_failure_terminal(self) -> bool {
        matches!(self, Self::Error | Self::RetryError)
    }

    /// Whether no further transition will occur.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.is_success_terminal() || self.is_failure_terminal()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Current status.
    #[serde(default)]
    pub status: JobStatus,
    /// Server error message, if any.
    #[serde(default)]
    pub error: String,
}
