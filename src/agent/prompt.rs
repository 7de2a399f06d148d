//! Prompt templates and query builders for the data collection agent.
//!
//! The user turn sent to the model is the caller's query followed by the
//! data collection instructions, the query syntax guide and a suffix. After
//! the tool loop a final prompt asks for the structured answer.

use std::path::{Path, PathBuf};

/// Operational instructions: use the tools, cover every source, sample
/// accounts, batch queries.
pub const DATA_COLLECTION_INSTRUCTIONS: &str = r#"
CRITICAL: You MUST use the available tools to gather data. Do NOT attempt to answer without using tools.

You have access to these tools:
1. search_web - Search and scrape web pages
2. search_twitter - Search Twitter for tweets from specific accounts

REQUIRED ACTIONS:
1. You MUST use search_web to fetch data from the provided websites
2. You MUST use search_twitter to gather sentiment from Twitter accounts
3. Do NOT skip using tools - they are required to complete this task

IMPORTANT: You must attempt to gather data from ALL available sources, even if some fail.
- Try ALL websites provided, even if some URLs timeout or return errors
- Pass several websites at once with the 'urls' array parameter to scrape them concurrently
- Execute Twitter searches for sentiment analysis, but IMPORTANT: Randomly sample Twitter accounts
  - Randomly select accounts from the provided list (typically 3-6 accounts for good coverage)
  - DO NOT exhaustively query all accounts - a random sample is sufficient
  - Query format: 'from:username (BTC OR Bitcoin OR ETH OR Ethereum OR SOL OR Solana)' - NO SPACE after 'from:'
  - Use hashtags and keywords: '#BTC OR #ETH OR bitcoin OR ethereum'
  - For faster execution, batch multiple queries using the 'queries' array parameter - they run concurrently
  - Example single query: 'from:JamesWynnReal (BTC OR Bitcoin OR ETH OR Ethereum) since:2025-11-03'
  - Example batch queries: ["from:JamesWynnReal (BTC OR Bitcoin) since:2025-11-03", "from:CryptoWendyO (ETH OR Ethereum) since:2025-11-03"]
- Continue with remaining sources even if earlier sources fail
- Partial data is acceptable - gather what you can from each source
- Use multiple iterations to systematically collect data from all sources before synthesizing results
"#;

/// Twitter advanced search syntax guide, the default query instructions.
pub const TWITTER_QUERY_INSTRUCTIONS: &str = r#"
watching now 	containing both "watching" and "now". This is the default operator.
"happy hour" 	containing the exact phrase "happy hour".
love OR hate 	containing either "love" or "hate" (or both).
beer -root 	containing "beer" but not "root".
#haiku 	containing the hashtag "haiku".
from:interior 	sent from Twitter account "interior". CRITICAL: NO SPACE after 'from:' (e.g., 'from:username', NOT 'from: username').
to:NASA 	a Tweet authored in reply to Twitter account "NASA".
@NASA 	mentioning Twitter account "NASA".
superhero since:2015-12-21 	containing "superhero" and sent since date "2015-12-21" (year-month-day).

If no date range is specified, default to the last 1 day (use since:YYYY-MM-DD format, typically one day before today).

CORRECT EXAMPLES:
- from:JamesWynnReal (BTC OR Bitcoin OR ETH OR Ethereum) since:2025-11-03
- from:CryptoWendyO #BTC OR #ETH since:2025-11-03

Batch queries (executed concurrently):
- Use the "queries" parameter with an array of queries for faster parallel execution

INCORRECT (DO NOT USE SPACES AFTER from:):
- from: JamesWynnReal
"#;

/// Default text appended after the instructions.
pub const DEFAULT_PROMPT_SUFFIX: &str = "If no date range is specified, search the last 1 day";

/// Default request for the structured answer after the tool loop.
pub const DEFAULT_FINAL_PROMPT: &str = "Return now only a JSON object with fields that match the \
    supplied schema. IMPORTANT: Each asset must have a distinct sentiment score based on its \
    unique data and signals - do not use the same sentiment value for different assets. Analyze \
    each asset independently.";

/// System prompt for the structured extraction call.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You convert an analyst's answer into a JSON object. \
    The object MUST validate against the JSON schema below. Use only information present in the \
    answer. Return ONLY the JSON object, no surrounding text.";

/// Default prompt directory under the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/gopher-client/prompts";

const DATA_COLLECTION_FILENAME: &str = "data_collection.md";
const QUERY_INSTRUCTIONS_FILENAME: &str = "query_instructions.md";
const SUFFIX_FILENAME: &str = "suffix.md";
const FINAL_FILENAME: &str = "final.md";
const EXTRACTION_FILENAME: &str = "extraction.md";

/// The agent's prompt templates.
///
/// Loaded from template files when available, falling back to the
/// compiled-in defaults one file at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Operational instructions appended to every query.
    pub data_collection: String,
    /// Default query instructions.
    pub query_instructions: String,
    /// Default prompt suffix.
    pub suffix: String,
    /// Default final prompt.
    pub final_prompt: String,
    /// System prompt for structured extraction.
    pub extraction: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptSet {
    /// Loads templates from `prompt_dir`, or from [`PromptSet::default_dir`]
    /// when unset.
    ///
    /// Each file is loaded independently; a missing file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(PathBuf::from).or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(path).ok())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            data_collection: load_file(DATA_COLLECTION_FILENAME, DATA_COLLECTION_INSTRUCTIONS),
            query_instructions: load_file(QUERY_INSTRUCTIONS_FILENAME, TWITTER_QUERY_INSTRUCTIONS),
            suffix: load_file(SUFFIX_FILENAME, DEFAULT_PROMPT_SUFFIX),
            final_prompt: load_file(FINAL_FILENAME, DEFAULT_FINAL_PROMPT),
            extraction: load_file(EXTRACTION_FILENAME, EXTRACTION_SYSTEM_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            data_collection: DATA_COLLECTION_INSTRUCTIONS.to_string(),
            query_instructions: TWITTER_QUERY_INSTRUCTIONS.to_string(),
            suffix: DEFAULT_PROMPT_SUFFIX.to_string(),
            final_prompt: DEFAULT_FINAL_PROMPT.to_string(),
            extraction: EXTRACTION_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in defaults to `dir`.
    ///
    /// Creates the directory if needed. Existing files are **not**
    /// overwritten. Returns the paths actually written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (DATA_COLLECTION_FILENAME, DATA_COLLECTION_INSTRUCTIONS),
            (QUERY_INSTRUCTIONS_FILENAME, TWITTER_QUERY_INSTRUCTIONS),
            (SUFFIX_FILENAME, DEFAULT_PROMPT_SUFFIX),
            (FINAL_FILENAME, DEFAULT_FINAL_PROMPT),
            (EXTRACTION_FILENAME, EXTRACTION_SYSTEM_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Default template directory, `None` if the home directory is unknown.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Composes the user turn: query, operational instructions, query
/// instructions and suffix, separated by blank lines. Empty parts are skipped.
#[must_use]
pub fn build_query_prompt(
    query: &str,
    data_collection: &str,
    instructions: &str,
    suffix: &str,
) -> String {
    [query, data_collection, instructions, suffix]
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Composes the standard market sentiment request.
#[must_use]
pub fn build_sentiment_query(assets: &[String], websites: &[String], accounts: &[String]) -> String {
    format!(
        "use all available tools to determine the market sentiment of the following assets: \
         {}, using the following websites: {}, and the following twitter accounts: {}",
        assets.join(", "),
        websites.join(", "),
        accounts.join(", ")
    )
}

/// Composes the user turn of the extraction call.
#[must_use]
pub fn build_extraction_prompt(schema: &str, answer: &str) -> String {
    format!("<schema>\n{schema}\n</schema>\n\n<answer>\n{answer}\n</answer>")
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_query_prompt_order_and_skips_empty() {
        let prompt = build_query_prompt("How is $SOL?", "USE TOOLS", "", "last 1 day");
        assert_eq!(prompt, "How is $SOL?\n\nUSE TOOLS\n\nlast 1 day");
    }

    #[test]
    fn test_sentiment_query() {
        let query = build_sentiment_query(
            &["Bitcoin".to_string(), "Ethereum".to_string()],
            &["https://coindesk.com".to_string()],
            &["JamesWynnReal".to_string(), "CryptoWendyO".to_string()],
        );
        assert!(query.contains("assets: Bitcoin, Ethereum,"));
        assert!(query.contains("websites: https://coindesk.com,"));
        assert!(query.ends_with("twitter accounts: JamesWynnReal, CryptoWendyO"));
    }

    #[test]
    fn test_load_overrides_single_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        std::fs::write(dir.path().join(SUFFIX_FILENAME), "Search the last 7 days")
            .unwrap_or_else(|e| panic!("write: {e}"));

        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.suffix, "Search the last 7 days");
        assert_eq!(prompts.final_prompt, DEFAULT_FINAL_PROMPT);
    }

    #[test]
    fn test_write_defaults_keeps_existing() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        std::fs::write(dir.path().join(FINAL_FILENAME), "custom")
            .unwrap_or_else(|e| panic!("write: {e}"));

        let written =
            PromptSet::write_defaults(dir.path()).unwrap_or_else(|e| panic!("write_defaults: {e}"));

        assert_eq!(written.len(), 4);
        let kept = std::fs::read_to_string(dir.path().join(FINAL_FILENAME)).unwrap_or_default();
        assert_eq!(kept, "custom");
        assert_eq!(PromptSet::load(Some(dir.path())).final_prompt, "custom");
    }

    #[test]
    fn test_defaults_mention_both_tools() {
        let prompts = PromptSet::defaults();
        assert!(prompts.data_collection.contains("search_web"));
        assert!(prompts.data_collection.contains("search_twitter"));
        assert!(prompts.query_instructions.contains("since:"));
    }
}
