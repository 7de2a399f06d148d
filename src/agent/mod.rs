//! LLM agent over the job-backed data collection tools.
//!
//! # Architecture
//!
//! ```text
//! User query → Agent
//!   ├── prompt = query + collection instructions + query syntax + suffix
//!   ├── agentic loop (≤ max_iterations)
//!   │   └── tool calls → search_twitter / search_web
//!   │       └── fan-out → N concurrent submit + poll pipelines
//!   ├── final prompt → free-form JSON answer
//!   └── structured extraction → SentimentReport (or caller's type)
//! ```
//!
//! # Feature Gate
//!
//! This module requires the `agent` feature flag (on by default).

pub mod agentic_loop;
pub mod config;
pub mod extraction;
pub mod fanout;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod tool;
pub mod tools;

pub use agentic_loop::{LoopLimits, LoopOutcome, agentic_loop};
pub use config::AgentConfig;
pub use fanout::{BatchResponse, QueryError, QueryInput, QueryResult, fan_out};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::{
    Agent, AssetSentiment, QueryOptions, QueryOutcome, SentimentReport, schema_for,
};
pub use prompt::{PromptSet, build_sentiment_query};
pub use provider::LlmProvider;
pub use providers::{OpenAiProvider, create_provider};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolParams, ToolResult, ToolSet};
pub use tools::{TwitterSearchTool, WebScrapeTool, data_collection_tools};
