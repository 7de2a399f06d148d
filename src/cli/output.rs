//! Output rendering for CLI commands.
//!
//! Every command renders either human-readable text or pretty JSON,
//! selected with the global `--format` flag.

use std::fmt::Write as _;

use serde::Serialize;

use crate::client::analysis::{AnalysisResponse, ContextualizeResponse, ExtractionResponse};
use crate::client::search::CollectionStats;
use crate::client::{Document, JobStatusResponse, JobSubmission};

/// Characters of document content shown per document in text output.
const CONTENT_PREVIEW_CHARS: usize = 280;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name. Unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON.
    ///
    /// Serialization failures are rendered as a JSON error object so the
    /// output stays machine-readable.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("serialization failed: {e}") }).to_string()
        })
    }
}

/// Renders retrieved documents.
#[must_use]
pub fn format_documents(documents: &[Document], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(documents);
    }

    if documents.is_empty() {
        return "No documents returned.\n".to_string();
    }

    let mut output = format!("{} document(s)\n", documents.len());
    for (i, doc) in documents.iter().enumerate() {
        let author = doc
            .meta_str("username")
            .or_else(|| doc.meta_str("author"))
            .or_else(|| doc.meta_str("url"));
        let _ = write!(output, "\n[{}]", i + 1);
        if !doc.source.is_empty() {
            let _ = write!(output, " {}", doc.source);
        }
        if !doc.id.is_empty() {
            let _ = write!(output, " {}", doc.id);
        }
        if let Some(author) = author {
            let _ = write!(output, " ({author})");
        }
        output.push('\n');
        let content = doc.content.trim();
        if !content.is_empty() {
            let _ = writeln!(output, "  {}", truncate_str(content, CONTENT_PREVIEW_CHARS));
        }
    }
    output
}

/// Renders an accepted submission.
#[must_use]
pub fn format_submission(submission: &JobSubmission, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{}\n", submission.uuid),
        OutputFormat::Json => format.to_json(&serde_json::json!({ "uuid": submission.uuid })),
    }
}

/// Renders a status probe.
#[must_use]
pub fn format_job_status(job_id: &str, status: &JobStatusResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!("Job {job_id}: {}\n", status.status);
            if !status.error.is_empty() {
                let _ = writeln!(output, "Error: {}", status.error);
            }
            output
        }
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "uuid": job_id,
            "status": status.status,
            "error": status.error,
            "terminal": status.status.is_terminal(),
        })),
    }
}

/// Renders an analysis reply.
#[must_use]
pub fn format_analysis(response: &AnalysisResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!("{}\n", response.analysis.trim());
            if !response.model_used.is_empty() {
                let _ = write!(
                    output,
                    "\n---\nModel: {} | Tokens: {}\n",
                    response.model_used, response.tokens_used
                );
            }
            output
        }
        OutputFormat::Json => format.to_json(response),
    }
}

/// Renders the model list of the analysis endpoint.
#[must_use]
pub fn format_models(models: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for model in models {
                let _ = writeln!(output, "{model}");
            }
            output
        }
        OutputFormat::Json => format.to_json(models),
    }
}

/// Renders an extracted search term.
#[must_use]
pub fn format_extraction(response: &ExtractionResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{}\n", response.search_term),
        OutputFormat::Json => format.to_json(response),
    }
}

/// Renders a contextualized query.
#[must_use]
pub fn format_contextualized(response: &ContextualizeResponse, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format!("{}\n", response.contextualized_query);
            if response.used_context && !response.reasoning.is_empty() {
                let _ = writeln!(output, "\nReasoning: {}", response.reasoning);
            }
            output
        }
        OutputFormat::Json => format.to_json(response),
    }
}

/// Renders collection statistics.
#[must_use]
pub fn format_metrics(stats: &[CollectionStats], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(stats);
    }

    let mut output = String::new();
    for (i, collection) in stats.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        for (key, value) in &collection.fields {
            let rendered = value
                .as_str()
                .map_or_else(|| value.to_string(), str::to_string);
            let _ = writeln!(output, "{key:<24} {rendered}");
        }
    }
    if output.is_empty() {
        output.push_str("No metrics reported.\n");
    }
    output
}

/// Truncates a string to at most `max_len` characters, ending in `...`
/// when shortened.
pub(crate) fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let head: String = s.chars().take(max_len - 3).collect();
    format!("{head}...")
}
