//! # gopher-client
//!
//! Client and LLM agent for the Gopher data-collection API.
//!
//! The API runs collection work as asynchronous jobs: a job is submitted,
//! polled until it reaches a terminal status, and its documents are then
//! fetched. [`Client`] wraps that lifecycle for Twitter, web, Reddit,
//! `LinkedIn` and `TikTok`, plus the immediate analysis, extraction and
//! search endpoints.
//!
//! With the `agent` feature (on by default), [`agent::Agent`] drives an
//! OpenAI-compatible model that gathers data through Twitter and web search
//! tools and returns a structured sentiment report.
//!
//! ## Example
//!
//! ```no_run
//! use gopher_client::Client;
//!
//! # async fn run() -> gopher_client::Result<()> {
//! let client = Client::from_env()?;
//! let tweets = client.search_twitter("from:JamesWynnReal (BTC OR Bitcoin)").await?;
//! println!("{} tweets", tweets.len());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "agent")]
pub mod agent;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;

pub use client::{
    Client, CompletionPoller, Document, JobApi, JobArguments, JobKind, JobRequest, JobStatus,
    JobSubmission, Source,
};
pub use config::ClientConfig;
pub use error::{ClientError, CommandError, Error, Result};

#[cfg(feature = "agent")]
pub use agent::{Agent, AgentConfig, QueryOptions, SentimentReport};
#[cfg(feature = "agent")]
pub use error::AgentError;
