//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
#[cfg(feature = "agent")]
use std::path::PathBuf;
use std::time::Duration;

use crate::config::parse_duration;

/// gopher: submit data-collection jobs and query the sentiment agent.
///
/// Reads `GOPHER_CLIENT_URL`, `GOPHER_CLIENT_TOKEN` and friends from the
/// environment or a `.env` file; flags override them.
#[derive(Parser, Debug)]
#[command(name = "gopher")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// API base URL (overrides `GOPHER_CLIENT_URL`).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API bearer token (overrides `GOPHER_CLIENT_TOKEN`).
    #[arg(long, global = true, hide = true)]
    pub token: Option<String>,

    /// Job completion deadline, e.g. `90s`, `2m` (overrides `GOPHER_CLIENT_TIMEOUT`).
    #[arg(long, global = true, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Status poll interval (overrides `GOPHER_CLIENT_POLL_INTERVAL`).
    #[arg(long, global = true, value_parser = parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Submit the job and print its UUID without waiting for results.
    #[arg(long, global = true)]
    pub no_wait: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Twitter jobs.
    #[command(subcommand)]
    Twitter(TwitterCommands),

    /// Web scraping jobs.
    #[command(subcommand)]
    Web(WebCommands),

    /// Reddit jobs.
    #[command(subcommand)]
    Reddit(RedditCommands),

    /// `LinkedIn` profile search jobs.
    #[command(subcommand)]
    Linkedin(LinkedinCommands),

    /// `TikTok` search, trending and transcription jobs.
    #[command(subcommand)]
    Tiktok(TiktokCommands),

    /// Inspect or wait for an already-submitted job.
    #[command(subcommand)]
    Job(JobCommands),

    /// Analyze texts with an LLM (immediate, no job).
    #[command(after_help = r#"Examples:
  gopher analyze -p "Summarize the sentiment" "BTC looks strong" "ETH is lagging"
  gopher analyze -p "Classify" --model openai/gpt-4o "text one" "text two"
  gopher analyze --list-models
"#)]
    Analyze {
        /// Analysis prompt.
        #[arg(short, long, required_unless_present = "list_models")]
        prompt: Option<String>,

        /// Texts to analyze.
        #[arg(required_unless_present = "list_models")]
        data: Vec<String>,

        /// Model id; server default when omitted.
        #[arg(short, long)]
        model: Option<String>,

        /// List the models accepted by the analysis endpoint.
        #[arg(long, conflicts_with_all = ["prompt", "data", "model"])]
        list_models: bool,
    },

    /// Extract an optimized search term from free text.
    #[command(after_help = r#"Examples:
  gopher extract "what are people saying about solana ETFs this week"
  gopher extract "bitcoin halving impact on miners" --max-terms 2
"#)]
    Extract {
        /// Free-text input.
        input: String,

        /// Maximum number of terms (1-6).
        #[arg(long, default_value = "4")]
        max_terms: u32,
    },

    /// Rewrite a query using earlier queries as context.
    #[command(after_help = r#"Examples:
  gopher contextualize "what about ethereum?" --history "bitcoin price today"
"#)]
    Contextualize {
        /// Query to rewrite.
        query: String,

        /// Earlier query, oldest first. Repeatable.
        #[arg(long = "history")]
        history: Vec<String>,

        /// Maximum history items used (1-10).
        #[arg(long, default_value = "5")]
        max_items: u32,
    },

    /// Show collection statistics.
    #[command(after_help = r#"Examples:
  gopher metrics                 # All collections
  gopher metrics twitter         # One source
  gopher metrics web --refresh   # Bypass the server cache
"#)]
    Metrics {
        /// Source (twitter, web, reddit, linkedin, tiktok); all when omitted.
        source: Option<String>,

        /// Recompute instead of using cached statistics.
        #[arg(long)]
        refresh: bool,
    },

    /// LLM agent over Twitter and web search.
    #[cfg(feature = "agent")]
    #[command(subcommand)]
    Agent(AgentCommands),
}

/// Twitter subcommands.
#[derive(Subcommand, Debug)]
pub enum TwitterCommands {
    /// Search tweets with advanced search syntax.
    #[command(after_help = r#"Examples:
  gopher twitter search "from:JamesWynnReal (BTC OR Bitcoin) since:2025-11-03"
  gopher twitter search '#ETH OR ethereum' -n 50
  gopher --no-wait twitter search bitcoin    # Print the job UUID only
"#)]
    Search {
        /// Search query.
        query: String,

        /// Maximum number of tweets.
        #[arg(short = 'n', long)]
        max_results: Option<u32>,
    },
}

/// Web subcommands.
#[derive(Subcommand, Debug)]
pub enum WebCommands {
    /// Scrape a URL.
    #[command(after_help = r#"Examples:
  gopher web scrape https://www.coindesk.com
  gopher web scrape https://example.com --max-depth 1 --max-pages 5
"#)]
    Scrape {
        /// Page URL.
        url: String,

        /// Link-follow depth.
        #[arg(long)]
        max_depth: Option<u32>,

        /// Maximum number of pages.
        #[arg(long)]
        max_pages: Option<u32>,
    },
}

/// Reddit subcommands.
#[derive(Subcommand, Debug)]
pub enum RedditCommands {
    /// Search posts.
    SearchPosts {
        /// Search query.
        query: String,

        /// Maximum number of items.
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// Search users.
    SearchUsers {
        /// Search query.
        query: String,

        /// Maximum number of items.
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// Search communities.
    SearchCommunities {
        /// Search query.
        query: String,

        /// Maximum number of items.
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// Scrape one or more Reddit URLs.
    #[command(after_help = r#"Examples:
  gopher reddit scrape-url https://www.reddit.com/r/CryptoCurrency/comments/abc123/
"#)]
    ScrapeUrl {
        /// Post or thread URLs.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Maximum number of items.
        #[arg(long)]
        max_items: Option<u32>,
    },
}

/// `LinkedIn` subcommands.
#[derive(Subcommand, Debug)]
pub enum LinkedinCommands {
    /// Search profiles.
    #[command(after_help = r#"Examples:
  gopher linkedin search "rust engineer berlin"
  gopher linkedin search "head of research" --mode full --max-items 10
"#)]
    Search {
        /// Search query.
        query: String,

        /// Scraper mode: short, full, full-email.
        #[arg(short, long, default_value = "short")]
        mode: String,

        /// Maximum number of profiles.
        #[arg(long)]
        max_items: Option<u32>,
    },
}

/// `TikTok` subcommands.
#[derive(Subcommand, Debug)]
pub enum TiktokCommands {
    /// Search videos.
    Search {
        /// Search query.
        query: String,

        /// Maximum number of videos.
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// Fetch trending videos.
    Trending {
        /// Sort key (vv, like, comment, repost).
        #[arg(long, default_value = "vv")]
        sort_by: String,

        /// Maximum number of videos.
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// Transcribe a video.
    Transcribe {
        /// Video URL.
        video_url: String,

        /// Preferred transcript language (BCP 47).
        #[arg(long)]
        language: Option<String>,
    },
}

/// Job subcommands.
#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// Show the current status of a job.
    Status {
        /// Job UUID.
        job_id: String,
    },

    /// Fetch the documents of a finished job without polling.
    Result {
        /// Job UUID.
        job_id: String,
    },

    /// Poll a job until it finishes, then print its documents.
    #[command(after_help = r#"Examples:
  id=$(gopher --no-wait twitter search bitcoin)
  gopher job wait "$id" --timeout 2m
"#)]
    Wait {
        /// Job UUID.
        job_id: String,
    },
}

/// Agent subcommands.
#[cfg(feature = "agent")]
#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// Run a free-form query through the agent.
    ///
    /// The model searches Twitter and the web with tools, then answers as
    /// a sentiment report. Requires an OpenAI-compatible API key.
    #[command(after_help = r#"Examples:
  gopher agent query "How is the market feeling about $SOL today?"
  gopher agent query "Sentiment on ETH from coindesk.com" --max-iterations 3
  OPENAI_TOKEN=sk-... gopher --format json agent query "BTC outlook"
"#)]
    Query {
        /// The question for the agent.
        query: String,

        /// Model, iteration limit and prompt overrides.
        #[command(flatten)]
        options: AgentOptions,
    },

    /// Determine market sentiment for assets from websites and accounts.
    #[command(after_help = r#"Examples:
  gopher agent sentiment -a Bitcoin -a Ethereum \
      -w https://www.coindesk.com -t JamesWynnReal -t CryptoWendyO
  gopher agent sentiment -a SOL -t solana --since 2025-11-01
"#)]
    Sentiment {
        /// Asset to score. Repeatable.
        #[arg(short, long = "asset", required = true)]
        assets: Vec<String>,

        /// Website to consult. Repeatable.
        #[arg(short, long = "website")]
        websites: Vec<String>,

        /// Twitter account to sample. Repeatable.
        #[arg(short = 't', long = "account")]
        accounts: Vec<String>,

        /// Only consider data since this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        /// Model, iteration limit and prompt overrides.
        #[command(flatten)]
        options: AgentOptions,
    },

    /// Write the default prompt templates to a directory.
    ///
    /// Existing files are kept. Edit the written files to customize the
    /// agent's prompts, then point `--prompt-dir` or `GOPHER_PROMPT_DIR`
    /// at the directory.
    #[command(after_help = r#"Examples:
  gopher agent init-prompts                      # ~/.config/gopher-client/prompts
  gopher agent init-prompts --dir ./prompts
"#)]
    InitPrompts {
        /// Target directory.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// Options shared by the agent query commands.
#[cfg(feature = "agent")]
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AgentOptions {
    /// Model (overrides `GOPHER_AGENT_MODEL`).
    #[arg(long)]
    pub model: Option<String>,

    /// Maximum tool-calling iterations.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Replacement for the query syntax instructions.
    #[arg(long)]
    pub instructions: Option<String>,

    /// Replacement for the prompt suffix.
    #[arg(long)]
    pub suffix: Option<String>,

    /// Replacement for the final-answer prompt.
    #[arg(long)]
    pub final_prompt: Option<String>,

    /// Directory of prompt template overrides.
    #[arg(long)]
    pub prompt_dir: Option<PathBuf>,
}
