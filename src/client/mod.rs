//! Job API client.
//!
//! [`Client`] submits jobs to the single live-search endpoint, polls them
//! with a [`CompletionPoller`] and fetches their documents. Per-source
//! argument types and helpers live in the submodules; the immediate
//! (non-job) endpoints live in [`analysis`] and [`search`].
//!
//! Every response body is checked for an inline `{"error": "..."}` even on
//! HTTP 2xx.

pub mod analysis;
pub mod document;
pub mod job;
pub mod linkedin;
pub mod poller;
pub mod reddit;
pub mod search;
pub mod tiktok;
pub mod twitter;
pub mod web;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use document::{Document, Source};
pub use job::{
    JobArguments, JobKind, JobRequest, JobStatus, JobStatusResponse, JobSubmission, JobType,
};
pub use linkedin::{LinkedInSearchArguments, ScraperMode};
pub use poller::CompletionPoller;
pub use reddit::{RedditArguments, RedditCapability};
pub use tiktok::{TikTokSearchArguments, TikTokTranscriptionArguments, TikTokTrendingArguments};
pub use twitter::TwitterSearchArguments;
pub use web::WebScrapeArguments;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Job submission endpoint; status and result hang off it.
pub const JOB_ENDPOINT: &str = "/v1/search/live";

/// Raw result body plus the URL it came from, decoded on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPayload {
    /// URL the body was fetched from.
    pub url: String,
    /// Raw response body.
    pub body: String,
}

impl ResultPayload {
    /// Decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] carrying the URL and raw body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        decode_body(&self.url, &self.body)
    }
}

/// The three job endpoints. The poller depends only on this trait.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Submits a job. An inline submission error is returned as
    /// [`ClientError::JobRejected`].
    async fn submit(&self, request: &JobRequest) -> Result<JobSubmission, ClientError>;

    /// Fetches the current status of a job.
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError>;

    /// Fetches the raw result body of a finished job.
    async fn job_result(&self, job_id: &str) -> Result<ResultPayload, ClientError>;
}

/// HTTP client for the data-collection API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl Client {
    /// Creates a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::HttpClient)?;

        debug!(
            base_url = %config.base_url,
            auth = config.token.is_some(),
            timeout = ?config.timeout,
            "created job API client"
        );

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            timeout: config.timeout,
            poll_interval: config.poll_interval,
        })
    }

    /// Creates a client from `.env` and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid environment values.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Deadline applied to every submit-and-wait call.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poller configured with this client's interval and deadline.
    #[must_use]
    pub const fn poller(&self) -> CompletionPoller {
        CompletionPoller::new()
            .interval(self.poll_interval)
            .timeout(self.timeout)
    }

    /// Builds and submits a job from typed arguments.
    ///
    /// # Errors
    ///
    /// Encoding, transport, status, decode and inline submission errors.
    pub async fn submit_job<A: JobArguments + ?Sized>(
        &self,
        args: &A,
    ) -> Result<JobSubmission, ClientError> {
        let request = JobRequest::new(args)?;
        let submission = self.submit(&request).await?;
        info!(job_id = %submission.uuid, kind = %args.kind(), "submitted job");
        Ok(submission)
    }

    /// Submits a job and waits for its documents.
    ///
    /// # Errors
    ///
    /// Any submission error, [`ClientError::JobFailed`] or
    /// [`ClientError::Timeout`].
    pub async fn run_job<A: JobArguments + ?Sized>(
        &self,
        args: &A,
    ) -> Result<Vec<Document>, ClientError> {
        self.run_job_with_cancel(args, &CancellationToken::new())
            .await
    }

    /// Submits a job and waits for its documents, stopping early on `cancel`.
    ///
    /// # Errors
    ///
    /// As [`Client::run_job`], plus [`ClientError::SubmitCancelled`] and
    /// [`ClientError::Cancelled`].
    pub async fn run_job_with_cancel<A: JobArguments + ?Sized>(
        &self,
        args: &A,
        cancel: &CancellationToken,
    ) -> Result<Vec<Document>, ClientError> {
        let submission = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(kind = %args.kind(), "submission cancelled");
                return Err(ClientError::SubmitCancelled {
                    kind: args.kind().to_string(),
                });
            }
            result = self.submit_job(args) => result?,
        };
        self.wait_for_job_with_cancel(&submission.uuid, cancel)
            .await
    }

    /// Waits for an already-submitted job.
    ///
    /// # Errors
    ///
    /// [`ClientError::JobFailed`], [`ClientError::Timeout`] and any
    /// transport, status or decode error.
    pub async fn wait_for_job(&self, job_id: &str) -> Result<Vec<Document>, ClientError> {
        self.wait_for_job_with_cancel(job_id, &CancellationToken::new())
            .await
    }

    /// Waits for an already-submitted job, stopping early on `cancel`.
    ///
    /// # Errors
    ///
    /// As [`Client::wait_for_job`], plus [`ClientError::Cancelled`].
    pub async fn wait_for_job_with_cancel(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Document>, ClientError> {
        let documents: Vec<Document> = self.poller().wait(self, job_id, cancel).await?;
        info!(job_id, documents = documents.len(), "job completed");
        Ok(documents)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn send(
        &self,
        method: &'static str,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<String, ClientError> {
        let transport = |source| ClientError::Transport {
            method,
            url: url.to_string(),
            source,
        };

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        debug!(method, url, status = status.as_u16(), "request completed");
        Ok(body)
    }

    /// POSTs JSON to an immediate endpoint and decodes the reply.
    pub(crate) async fn post_json<B, T>(&self, path: &str, payload: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let builder = self.request(Method::POST, &url).json(payload);
        let body = self.send("POST", &url, builder).await?;
        if let Some(message) = soft_error(&body) {
            return Err(ClientError::Api { url, message });
        }
        decode_body(&url, &body)
    }

    /// GETs an immediate endpoint and decodes the reply.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let builder = self.request(Method::GET, &url);
        let body = self.send("GET", &url, builder).await?;
        if let Some(message) = soft_error(&body) {
            return Err(ClientError::Api { url, message });
        }
        decode_body(&url, &body)
    }
}

#[async_trait]
impl JobApi for Client {
    async fn submit(&self, request: &JobRequest) -> Result<JobSubmission, ClientError> {
        let url = self.url(JOB_ENDPOINT);
        let builder = self.request(Method::POST, &url).json(request);
        let body = self.send("POST", &url, builder).await?;

        let submission: JobSubmission = decode_body(&url, &body)?;
        if !submission.error.is_empty() {
            return Err(ClientError::JobRejected {
                message: submission.error,
            });
        }
        if submission.uuid.is_empty() {
            return Err(ClientError::JobRejected {
                message: format!("no job id in response from {url}"),
            });
        }
        Ok(submission)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError> {
        let url = self.url(&format!("{JOB_ENDPOINT}/status/{job_id}"));
        let builder = self.request(Method::GET, &url);
        let body = self.send("GET", &url, builder).await?;
        decode_body(&url, &body)
    }

    async fn job_result(&self, job_id: &str) -> Result<ResultPayload, ClientError> {
        let url = self.url(&format!("{JOB_ENDPOINT}/result/{job_id}"));
        let builder = self.request(Method::GET, &url);
        let body = self.send("GET", &url, builder).await?;

        if let Some(message) = soft_error(&body) {
            return Err(ClientError::JobFailed {
                job_id: job_id.to_string(),
                status: JobStatus::Done.to_string(),
                message,
            });
        }
        Ok(ResultPayload { url, body })
    }
}

fn decode_body<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        body: body.to_string(),
        source,
    })
}

/// Extracts a non-empty inline `error` string from a JSON object body.
fn soft_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(serde_json::Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
