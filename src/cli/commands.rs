//! CLI command implementations.
//!
//! Each command builds a [`Client`] from flags and environment, runs its
//! async work on a fresh runtime, and renders the result as text or JSON.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::format_push_string)]
#![allow(clippy::too_many_lines)]

use std::future::Future;
use std::str::FromStr;

use chrono::{TimeDelta, Utc};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::output::{
    OutputFormat, format_analysis, format_contextualized, format_documents, format_extraction,
    format_job_status, format_metrics, format_models, format_submission,
};
#[cfg(feature = "agent")]
use crate::cli::parser::{AgentCommands, AgentOptions};
use crate::cli::parser::{
    Cli, Commands, JobCommands, LinkedinCommands, RedditCommands, TiktokCommands,
    TwitterCommands, WebCommands,
};
use crate::client::analysis::{AnalysisRequest, ChatHistoryItem};
use crate::client::{
    Client, Document, JobApi, JobArguments, LinkedInSearchArguments, RedditArguments,
    ScraperMode, Source, TikTokSearchArguments, TikTokTranscriptionArguments,
    TikTokTrendingArguments, TwitterSearchArguments, WebScrapeArguments,
};
use crate::config::{ClientConfig, load_dotenv};
use crate::error::{CommandError, Error, Result};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Twitter(TwitterCommands::Search { query, max_results }) => {
            let mut args = TwitterSearchArguments::new(query);
            if let Some(n) = max_results {
                args = args.with_max_results(*n);
            }
            run_job_command(cli, &args, format)
        }
        Commands::Web(WebCommands::Scrape {
            url,
            max_depth,
            max_pages,
        }) => {
            let mut args = WebScrapeArguments::new(url);
            if let Some(depth) = max_depth {
                args = args.with_max_depth(*depth);
            }
            if let Some(pages) = max_pages {
                args = args.with_max_pages(*pages);
            }
            run_job_command(cli, &args, format)
        }
        Commands::Reddit(sub) => {
            let (args, max_items) = match sub {
                RedditCommands::SearchPosts { query, max_items } => {
                    (RedditArguments::search_posts(query), max_items)
                }
                RedditCommands::SearchUsers { query, max_items } => {
                    (RedditArguments::search_users(query), max_items)
                }
                RedditCommands::SearchCommunities { query, max_items } => {
                    (RedditArguments::search_communities(query), max_items)
                }
                RedditCommands::ScrapeUrl { urls, max_items } => {
                    (RedditArguments::scrape_urls(urls.clone()), max_items)
                }
            };
            let args = args.with_max_items(max_items.unwrap_or(0));
            run_job_command(cli, &args, format)
        }
        Commands::Linkedin(LinkedinCommands::Search {
            query,
            mode,
            max_items,
        }) => {
            let mode = ScraperMode::from_str(mode).map_err(CommandError::InvalidArgument)?;
            let args = LinkedInSearchArguments {
                max_items: *max_items,
                ..LinkedInSearchArguments::new(query, mode)
            };
            run_job_command(cli, &args, format)
        }
        Commands::Tiktok(sub) => match sub {
            TiktokCommands::Search { query, max_items } => {
                let args = TikTokSearchArguments {
                    max_items: *max_items,
                    ..TikTokSearchArguments::new(query)
                };
                run_job_command(cli, &args, format)
            }
            TiktokCommands::Trending { sort_by, max_items } => {
                let args = TikTokTrendingArguments {
                    max_items: *max_items,
                    ..TikTokTrendingArguments::new(sort_by)
                };
                run_job_command(cli, &args, format)
            }
            TiktokCommands::Transcribe {
                video_url,
                language,
            } => {
                let args = TikTokTranscriptionArguments {
                    language: language.clone(),
                    ..TikTokTranscriptionArguments::new(video_url)
                };
                run_job_command(cli, &args, format)
            }
        },
        Commands::Job(sub) => execute_job(cli, sub, format),
        Commands::Analyze {
            prompt,
            data,
            model,
            list_models,
        } => {
            if *list_models {
                return cmd_models(cli, format);
            }
            let prompt = prompt
                .as_deref()
                .ok_or_else(|| CommandError::InvalidArgument("--prompt is required".to_string()))?;
            cmd_analyze(cli, prompt, data, model.as_deref(), format)
        }
        Commands::Extract { input, max_terms } => {
            let client = build_client(cli)?;
            let response = block_on(|_| client.extract_search_terms(input, *max_terms))?;
            Ok(format_extraction(&response, format))
        }
        Commands::Contextualize {
            query,
            history,
            max_items,
        } => cmd_contextualize(cli, query, history, *max_items, format),
        Commands::Metrics { source, refresh } => {
            cmd_metrics(cli, source.as_deref(), *refresh, format)
        }
        #[cfg(feature = "agent")]
        Commands::Agent(sub) => execute_agent(cli, sub, format),
    }
}

/// Builds the API client: flags first, then environment and `.env`.
fn build_client(cli: &Cli) -> Result<Client> {
    load_dotenv();

    let mut builder = ClientConfig::builder();
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(token) = &cli.token {
        builder = builder.token(token);
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(interval) = cli.poll_interval {
        builder = builder.poll_interval(interval);
    }

    let config = builder.from_env()?.build()?;
    Ok(Client::new(&config)?)
}

/// Runs async work on a fresh runtime as the sync/async bridge.
///
/// Ctrl-C cancels the token handed to `work`.
fn block_on<F, Fut, T, E>(work: F) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<Error>,
{
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    let cancel = CancellationToken::new();
    rt.block_on(async {
        let trigger = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                trigger.cancel();
            }
        });
        let result = work(cancel).await;
        interrupt.abort();
        result.map_err(Into::into)
    })
}

/// Submits a job, then either prints its UUID (`--no-wait`) or waits for
/// its documents.
fn run_job_command<A: JobArguments>(cli: &Cli, args: &A, format: OutputFormat) -> Result<String> {
    let client = build_client(cli)?;

    if cli.no_wait {
        let submission = block_on(|_| client.submit_job(args))?;
        return Ok(format_submission(&submission, format));
    }

    let documents =
        block_on(|cancel| async move { client.run_job_with_cancel(args, &cancel).await })?;
    Ok(format_documents(&documents, format))
}

fn execute_job(cli: &Cli, sub: &JobCommands, format: OutputFormat) -> Result<String> {
    let client = build_client(cli)?;

    match sub {
        JobCommands::Status { job_id } => {
            let status = block_on(|_| client.job_status(job_id))?;
            Ok(format_job_status(job_id, &status, format))
        }
        JobCommands::Result { job_id } => {
            let payload = block_on(|_| client.job_result(job_id))?;
            let documents: Vec<Document> = payload.decode()?;
            Ok(format_documents(&documents, format))
        }
        JobCommands::Wait { job_id } => {
            let documents = block_on(|cancel| async move {
                client.wait_for_job_with_cancel(job_id, &cancel).await
            })?;
            Ok(format_documents(&documents, format))
        }
    }
}

fn cmd_analyze(
    cli: &Cli,
    prompt: &str,
    data: &[String],
    model: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    if data.is_empty() {
        return Err(CommandError::InvalidArgument("no data to analyze".to_string()).into());
    }

    let mut request = AnalysisRequest::new(data.to_vec(), prompt);
    if let Some(model) = model {
        request = request.with_model(model);
    }

    let client = build_client(cli)?;
    let response = block_on(|_| client.analyze_data(request))?;
    Ok(format_analysis(&response, format))
}

fn cmd_models(cli: &Cli, format: OutputFormat) -> Result<String> {
    let client = build_client(cli)?;
    let models = block_on(|_| client.available_models())?;
    Ok(format_models(&models, format))
}

fn cmd_contextualize(
    cli: &Cli,
    query: &str,
    history: &[String],
    max_items: u32,
    format: OutputFormat,
) -> Result<String> {
    let history = history_items(history);
    let client = build_client(cli)?;
    let response = block_on(|_| client.contextualize_query(query, &history, max_items))?;
    Ok(format_contextualized(&response, format))
}

/// Timestamps history one minute apart, ending now, in the order given.
fn history_items(queries: &[String]) -> Vec<ChatHistoryItem> {
    let now = Utc::now();
    let count = queries.len();
    queries
        .iter()
        .enumerate()
        .map(|(i, query)| {
            let minutes_ago = i64::try_from(count - i).unwrap_or(0);
            ChatHistoryItem {
                query: query.clone(),
                timestamp: (now - TimeDelta::minutes(minutes_ago)).to_rfc3339(),
            }
        })
        .collect()
}

fn cmd_metrics(
    cli: &Cli,
    source: Option<&str>,
    refresh: bool,
    format: OutputFormat,
) -> Result<String> {
    let source = source
        .map(Source::from_str)
        .transpose()
        .map_err(CommandError::InvalidArgument)?;

    let client = build_client(cli)?;
    let stats = match source {
        Some(source) => vec![block_on(|_| client.metrics(source, refresh))?],
        None => block_on(|_| client.all_metrics(refresh))?,
    };
    Ok(format_metrics(&stats, format))
}

// ==================== Agent Commands ====================

/// Dispatches agent subcommands.
#[cfg(feature = "agent")]
fn execute_agent(cli: &Cli, sub: &AgentCommands, format: OutputFormat) -> Result<String> {
    use crate::agent::build_sentiment_query;

    match sub {
        AgentCommands::Query { query, options } => cmd_agent_query(cli, query, options, format),
        AgentCommands::Sentiment {
            assets,
            websites,
            accounts,
            since,
            options,
        } => {
            let mut options = options.clone();
            if let Some(since) = since {
                chrono::NaiveDate::parse_from_str(since, "%Y-%m-%d").map_err(|e| {
                    CommandError::InvalidArgument(format!("--since {since}: {e}"))
                })?;
                if options.suffix.is_none() {
                    options.suffix = Some(format!(
                        "Only use data published since {since}. Add since:{since} to every Twitter query."
                    ));
                }
            }
            let query = build_sentiment_query(assets, websites, accounts);
            cmd_agent_query(cli, &query, &options, format)
        }
        AgentCommands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

#[cfg(feature = "agent")]
fn cmd_agent_query(
    cli: &Cli,
    query: &str,
    options: &AgentOptions,
    format: OutputFormat,
) -> Result<String> {
    use crate::agent::{
        Agent, AgentConfig, QueryOptions, QueryOutcome, SentimentReport, create_provider,
        schema_for,
    };
    use std::sync::Arc;

    let client = build_client(cli)?;

    let mut builder = AgentConfig::builder();
    if let Some(model) = &options.model {
        builder = builder.model(model);
    }
    if let Some(n) = options.max_iterations {
        builder = builder.max_iterations(n);
    }
    if let Some(dir) = &options.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    let config = builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}"))
    })?;

    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let agent = Agent::new(&client, Arc::from(provider), config);

    let mut query_options = QueryOptions::new();
    if let Some(instructions) = &options.instructions {
        query_options = query_options.with_instructions(instructions);
    }
    if let Some(suffix) = &options.suffix {
        query_options = query_options.with_prompt_suffix(suffix);
    }
    if let Some(prompt) = &options.final_prompt {
        query_options = query_options.with_final_prompt(prompt);
    }
    let schema = schema_for::<SentimentReport>();

    let outcome: QueryOutcome<SentimentReport> = block_on(|cancel| async move {
        agent.run(query, &query_options, &schema, &cancel).await
    })
    .map_err(|e| CommandError::ExecutionFailed(format!("Query failed: {e}")))?;

    match format {
        OutputFormat::Text => Ok(format_sentiment_outcome(&outcome, cli.verbose)),
        OutputFormat::Json => Ok(format.to_json(&outcome)),
    }
}

#[cfg(feature = "agent")]
fn format_sentiment_outcome(
    outcome: &crate::agent::QueryOutcome<crate::agent::SentimentReport>,
    verbose: bool,
) -> String {
    let mut output = String::new();

    if outcome.extracted {
        for asset in &outcome.output.assets {
            output.push_str(&format!(
                "{:<12} {:>3}/100  {}\n",
                asset.asset, asset.sentiment, asset.reasoning
            ));
        }
        if outcome.output.assets.is_empty() {
            output.push_str("No assets in the report.\n");
        }
    } else {
        output.push_str("Structured extraction failed; raw answer follows.\n\n");
        output.push_str(outcome.answer.trim());
        output.push('\n');
    }

    if verbose && outcome.extracted {
        output.push_str(&format!("\nAnswer:\n{}\n", outcome.answer.trim()));
    }

    output.push_str(&format!(
        "\n---\nIterations: {} | Tool calls: {} ({} failed) | Tokens: {} | Time: {:.1}s\n",
        outcome.iterations,
        outcome.tool_calls,
        outcome.failed_tool_calls,
        outcome.usage.total_tokens,
        std::time::Duration::from_millis(outcome.elapsed_ms).as_secs_f64()
    ));
    output
}

#[cfg(feature = "agent")]
fn cmd_init_prompts(dir: Option<&std::path::Path>, format: OutputFormat) -> Result<String> {
    use crate::agent::PromptSet;

    let target_dir = dir
        .map(std::path::PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit these files to customize the agent prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::client::JOB_ENDPOINT;
    use crate::config::tests::env_lock;
    use clap::Parser;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn cli(base_url: &str, args: &[&str]) -> Cli {
        let mut argv = vec![
            "gopher",
            "--base-url",
            base_url,
            "--token",
            "test-token",
            "--timeout",
            "5s",
            "--poll-interval",
            "10ms",
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_twitter_search_waits_for_documents() {
        let _guard = env_lock();
        let mut server = Server::new();
        let submit = server
            .mock("POST", JOB_ENDPOINT)
            .match_body(Matcher::PartialJson(json!({
                "type": "twitter",
                "arguments": {"type": "searchbyquery", "query": "bitcoin", "max_results": 5}
            })))
            .with_body(r#"{"uuid":"job-1"}"#)
            .create();
        server
            .mock("GET", "/v1/search/live/status/job-1")
            .with_body(r#"{"status":"done"}"#)
            .create();
        server
            .mock("GET", "/v1/search/live/result/job-1")
            .with_body(r#"[{"id":"t1","source":"twitter","content":"BTC breaks out"}]"#)
            .create();

        let output = execute(&cli(
            &server.url(),
            &["--format", "json", "twitter", "search", "bitcoin", "-n", "5"],
        ))
        .unwrap_or_else(|e| panic!("execute failed: {e}"));

        submit.assert();
        let docs: serde_json::Value = serde_json::from_str(&output).unwrap_or_default();
        assert_eq!(docs[0]["content"], "BTC breaks out");
    }

    #[test]
    fn test_no_wait_prints_uuid_only() {
        let _guard = env_lock();
        let mut server = Server::new();
        server
            .mock("POST", JOB_ENDPOINT)
            .with_body(r#"{"uuid":"job-77"}"#)
            .create();
        let status = server
            .mock("GET", Matcher::Regex("/status/".to_string()))
            .expect(0)
            .create();

        let output = execute(&cli(
            &server.url(),
            &["--no-wait", "web", "scrape", "https://example.com"],
        ))
        .unwrap_or_else(|e| panic!("execute failed: {e}"));

        assert_eq!(output, "job-77\n");
        status.assert();
    }

    #[test]
    fn test_job_status_reports_error() {
        let _guard = env_lock();
        let mut server = Server::new();
        server
            .mock("GET", "/v1/search/live/status/job-9")
            .with_body(r#"{"status":"error","error":"worker crashed"}"#)
            .create();

        let output = execute(&cli(&server.url(), &["job", "status", "job-9"]))
            .unwrap_or_else(|e| panic!("execute failed: {e}"));

        assert!(output.contains("Job job-9: error"));
        assert!(output.contains("worker crashed"));
    }

    #[test]
    fn test_job_wait_failed_job_is_error() {
        let _guard = env_lock();
        let mut server = Server::new();
        server
            .mock("GET", "/v1/search/live/status/job-3")
            .with_body(r#"{"status":"error(retrying)","error":"upstream 429"}"#)
            .create();

        let result = execute(&cli(&server.url(), &["job", "wait", "job-3"]));

        let Err(e) = result else {
            panic!("expected a failed job");
        };
        assert!(e.to_string().contains("upstream 429"));
    }

    #[test]
    fn test_reddit_search_sends_capability_and_cap() {
        let _guard = env_lock();
        let mut server = Server::new();
        let submit = server
            .mock("POST", JOB_ENDPOINT)
            .match_body(Matcher::Json(json!({
                "type": "reddit",
                "arguments": {"type": "searchposts", "queries": ["rust"], "max_items": 3}
            })))
            .with_body(r#"{"uuid":"job-r"}"#)
            .create();

        execute(&cli(
            &server.url(),
            &["--no-wait", "reddit", "search-posts", "rust", "--max-items", "3"],
        ))
        .unwrap_or_else(|e| panic!("execute failed: {e}"));

        submit.assert();
    }

    #[test]
    fn test_linkedin_rejects_unknown_mode() {
        let result = execute(&cli(
            "http://127.0.0.1:1",
            &["linkedin", "search", "engineer", "--mode", "huge"],
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_metrics_rejects_unknown_source() {
        let result = execute(&cli("http://127.0.0.1:1", &["metrics", "myspace"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_clamps_and_prints_term() {
        let _guard = env_lock();
        let mut server = Server::new();
        server
            .mock("POST", "/v1/extraction")
            .match_body(Matcher::Json(json!({"userInput": "solana etf news", "maxTerms": 4})))
            .with_body(r#"{"searchTerm":"solana ETF","thinking":"","uuid":"u"}"#)
            .create();

        let output = execute(&cli(
            &server.url(),
            &["extract", "solana etf news", "--max-terms", "9"],
        ))
        .unwrap_or_else(|e| panic!("execute failed: {e}"));

        assert_eq!(output, "solana ETF\n");
    }

    #[test]
    fn test_history_items_oldest_first() {
        let items = history_items(&["first".to_string(), "second".to_string()]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].query, "first");
        assert!(items[0].timestamp < items[1].timestamp);
    }

    #[cfg(feature = "agent")]
    #[test]
    fn test_cmd_init_prompts() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));

        let output = cmd_init_prompts(Some(dir.path()), OutputFormat::Text)
            .unwrap_or_else(|e| panic!("init-prompts failed: {e}"));
        assert!(output.contains("Wrote 5 prompt template(s)"));

        let again = cmd_init_prompts(Some(dir.path()), OutputFormat::Json)
            .unwrap_or_else(|e| panic!("init-prompts failed: {e}"));
        let value: serde_json::Value = serde_json::from_str(&again).unwrap_or_default();
        assert_eq!(value["count"], 0);
    }

    #[cfg(feature = "agent")]
    #[test]
    fn test_sentiment_rejects_bad_since() {
        let result = execute(&cli(
            "http://127.0.0.1:1",
            &["agent", "sentiment", "-a", "BTC", "--since", "yesterday"],
        ));
        let Err(Error::Command(CommandError::InvalidArgument(message))) = result else {
            panic!("expected an invalid argument error");
        };
        assert!(message.contains("--since"));
    }

    #[cfg(feature = "agent")]
    #[test]
    fn test_format_sentiment_outcome() {
        use crate::agent::{AssetSentiment, QueryOutcome, SentimentReport, TokenUsage};

        let outcome = QueryOutcome {
            output: SentimentReport {
                assets: vec![AssetSentiment {
                    asset: "Bitcoin".to_string(),
                    reasoning: "ETF inflows".to_string(),
                    sentiment: 72,
                }],
            },
            extracted: true,
            answer: "BTC bullish".to_string(),
            iterations: 2,
            tool_calls: 3,
            failed_tool_calls: 1,
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                total_tokens: 120,
            },
            elapsed_ms: 1500,
        };

        let output = format_sentiment_outcome(&outcome, false);
        assert!(output.contains("Bitcoin"));
        assert!(output.contains(" 72/100  ETF inflows"));
        assert!(output.contains("Tool calls: 3 (1 failed) | Tokens: 120 | Time: 1.5s"));
        assert!(!output.contains("BTC bullish"));
    }
}
