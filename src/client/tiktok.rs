//! `TikTok` search, trending and transcription jobs.

use serde::{Deserialize, Serialize};

use super::{Client, Document, JobArguments, JobKind, JobSubmission};
use crate::error::ClientError;

/// Arguments for transcribing one video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TikTokTranscriptionArguments {
    /// Video URL.
    pub video_url: String,
    /// Preferred transcript language (BCP 47), server default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TikTokTranscriptionArguments {
    /// Creates arguments for `video_url`.
    #[must_use]
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            language: None,
        }
    }
}

impl JobArguments for TikTokTranscriptionArguments {
    fn kind(&self) -> JobKind {
        JobKind::TiktokTranscription
    }

    fn capability(&self) -> &'static str {
        "transcription"
    }
}

/// Arguments for a `TikTok` query search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TikTokSearchArguments {
    /// Search terms.
    pub search: Vec<String>,
    /// Maximum number of videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

impl TikTokSearchArguments {
    /// Creates arguments for a single query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            search: vec![query.into()],
            max_items: None,
        }
    }
}

impl JobArguments for TikTokSearchArguments {
    fn kind(&self) -> JobKind {
        JobKind::TiktokSearch
    }

    fn capability(&self) -> &'static str {
        "searchbyquery"
    }
}

/// Arguments for the trending feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TikTokTrendingArguments {
    /// Sort key, e.g. `vv` (views), `like`, `comment`, `repost`.
    pub sort_by: String,
    /// Maximum number of videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

impl Default for TikTokTrendingArguments {
    fn default() -> Self {
        Self {
            sort_by: "vv".to_string(),
            max_items: None,
        }
    }
}

impl TikTokTrendingArguments {
    /// Creates arguments sorted by `sort_by`; empty falls back to views.
    #[must_use]
    pub fn new(sort_by: impl Into<String>) -> Self {
        let sort_by = sort_by.into();
        if sort_by.is_empty() {
            Self::default()
        } else {
            Self {
                sort_by,
                max_items: None,
            }
        }
    }
}

impl JobArguments for TikTokTrendingArguments {
    fn kind(&self) -> JobKind {
        JobKind::TiktokTrending
    }

    fn capability(&self) -> &'static str {
        "searchbytrending"
    }
}

impl Client {
    /// Submits a transcription without waiting.
    pub async fn submit_tiktok_transcription(
        &self,
        video_url: &str,
    ) -> Result<JobSubmission, ClientError> {
        self.submit_job(&TikTokTranscriptionArguments::new(video_url))
            .await
    }

    /// Transcribes a video and waits for the transcript documents.
    pub async fn transcribe_tiktok(&self, video_url: &str) -> Result<Vec<Document>, ClientError> {
        self.run_job(&TikTokTranscriptionArguments::new(video_url))
            .await
    }

    /// Submits a query search without waiting.
    pub async fn submit_tiktok_search(&self, query: &str) -> Result<JobSubmission, ClientError> {
        self.submit_job(&TikTokSearchArguments::new(query)).await
    }

    /// Searches `TikTok` and waits for videos.
    pub async fn search_tiktok(&self, query: &str) -> Result<Vec<Document>, ClientError> {
        self.run_job(&TikTokSearchArguments::new(query)).await
    }

    /// Submits a trending request without waiting.
    pub async fn submit_tiktok_trending(
        &self,
        sort_by: &str,
    ) -> Result<JobSubmission, ClientError> {
        self.submit_job(&TikTokTrendingArguments::new(sort_by))
            .await
    }

    /// Fetches trending videos and waits for them.
    pub async fn tiktok_trending(&self, sort_by: &str) -> Result<Vec<Document>, ClientError> {
        self.run_job(&TikTokTrendingArguments::new(sort_by)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::JobRequest;
    use serde_json::json;

    #[test]
    fn test_each_tiktok_kind_has_its_capability() {
        let transcription = JobRequest::new(&TikTokTranscriptionArguments::new(
            "https://www.tiktok.com/@user/video/1",
        ))
        .unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(
            serde_json::to_value(&transcription).unwrap_or_default(),
            json!({
                "type": "tiktok",
                "arguments": {"type": "transcription", "video_url": "https://www.tiktok.com/@user/video/1"}
            })
        );

        let search = JobRequest::new(&TikTokSearchArguments::new("solana"))
            .unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(search.arguments["type"], "searchbyquery");
        assert_eq!(search.arguments["search"], json!(["solana"]));

        let trending = JobRequest::new(&TikTokTrendingArguments::new(""))
            .unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(trending.arguments["type"], "searchbytrending");
        assert_eq!(trending.arguments["sort_by"], "vv");
    }
}
