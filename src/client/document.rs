//! Retrieved content items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of retrieved content (tweet, page, post, profile, video).
///
/// Fields this client does not model are kept in `extra` so a document
/// serializes back to what the server sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Server-side identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Source platform name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Text or markdown body.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    /// Source-specific metadata (author, timestamps, engagement counts).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Relevance score from similarity or hybrid search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Unmodeled fields, including the raw `embedding` vector.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Looks up a metadata value by key.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Looks up a string metadata value by key.
    #[must_use]
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta(key).and_then(Value::as_str)
    }

    /// Decodes the embedding vector, when the server included a non-null one.
    ///
    /// The raw value stays in `extra` so it serializes back unchanged.
    #[must_use]
    pub fn embedding(&self) -> Option<Vec<f64>> {
        self.extra
            .get("embedding")?
            .as_array()?
            .iter()
            .map(Value::as_f64)
            .collect()
    }
}

/// Data source selector for search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Twitter / X.
    Twitter,
    /// Web pages.
    Web,
    /// Reddit.
    Reddit,
    /// `LinkedIn`.
    Linkedin,
    /// `TikTok`.
    Tiktok,
}

impl Source {
    /// Wire name.
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

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twitter" | "x" => Ok(Self::Twitter),
            "web" => Ok(Self::Web),
            "reddit" => Ok(Self::Reddit),
            "linkedin" => Ok(Self::Linkedin),
            "tiktok" => Ok(Self::Tiktok),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_keeps_unknown_fields() {
        let raw = json!({
            "id": "1789",
            "source": "twitter",
            "content": "gm bitcoin",
            "metadata": {"username": "alice", "likes": 12},
            "lang": "en"
        });

        let doc: Document = serde_json::from_value(raw.clone()).unwrap_or_default();
        assert_eq!(doc.id, "1789");
        assert_eq!(doc.meta_str("username"), Some("alice"));
        assert_eq!(doc.extra.get("lang"), Some(&json!("en")));
        assert_eq!(serde_json::to_value(&doc).unwrap_or_default(), raw);
    }

    #[test]
    fn test_document_minimal() {
        let doc: Document = serde_json::from_value(json!({})).unwrap_or_default();
        assert!(doc.content.is_empty());
        assert!(doc.embedding().is_none());
    }

    #[test]
    fn test_document_embedding_keeps_precision_and_null() {
        let raw = json!({
            "id": "42",
            "embedding": [0.123_456_789_012_345, -1.5e-12, 3.0]
        });
        let doc: Document = serde_json::from_value(raw.clone()).unwrap_or_default();
        assert_eq!(
            doc.embedding(),
            Some(vec![0.123_456_789_012_345, -1.5e-12, 3.0])
        );
        assert_eq!(serde_json::to_value(&doc).unwrap_or_default(), raw);

        let raw = json!({"id": "43", "embedding": null});
        let doc: Document = serde_json::from_value(raw.clone()).unwrap_or_default();
        assert!(doc.embedding().is_none());
        assert_eq!(serde_json::to_value(&doc).unwrap_or_default(), raw);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!("Twitter".parse::<Source>(), Ok(Source::Twitter));
        assert_eq!("x".parse::<Source>(), Ok(Source::Twitter));
        assert!("myspace".parse::<Source>().is_err());
    }
}
