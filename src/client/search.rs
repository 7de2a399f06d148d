//! Immediate search endpoints over already-indexed documents, plus
//! collection metrics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use super::{Client, Document, Source};
use crate::error::ClientError;

/// Default number of results for indexed search.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// A weighted query component of a hybrid search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedQuery {
    /// Query text.
    pub query: String,
    /// Relative weight.
    pub weight: f64,
}

/// Parameters for `/v1/search/hybrid`: keyword and vector search blended by weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchParams {
    /// Full-text component.
    pub text_query: WeightedQuery,
    /// Vector-similarity component.
    pub similarity_query: WeightedQuery,
    /// Sources to search; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    /// Keywords documents must contain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// How keywords combine (`and` / `or`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub operator: String,
    /// Result cap.
    pub max_results: u32,
}

/// Parameters for `/v1/search/similarity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilaritySearchParams {
    /// Query text.
    pub query: String,
    /// Keywords documents must contain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Sources to search; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    /// Result cap.
    pub max_results: u32,
    /// How keywords combine (`and` / `or`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keyword_operator: String,
}

impl SimilaritySearchParams {
    /// Creates parameters for `query` with the default result cap.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
            ..Self::default()
        }
    }
}

/// Statistics for one collection. The server's field set varies by source,
/// so values are kept as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// All reported fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CollectionStats {
    /// Looks up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Client {
    /// Runs a hybrid keyword + similarity search.
    pub async fn hybrid_search(
        &self,
        params: &HybridSearchParams,
    ) -> Result<Vec<Document>, ClientError> {
        self.post_json("/v1/search/hybrid", params)
            .await
            .inspect_err(|e| {
                error!(
                    query = %params.text_query.query,
                    text = %params.similarity_query.query,
                    error = %e,
                    "hybrid search failed"
                );
            })
    }

    /// Runs a similarity search.
    pub async fn similarity_search(
        &self,
        params: &SimilaritySearchParams,
    ) -> Result<Vec<Document>, ClientError> {
        self.post_json("/v1/search/similarity", params)
            .await
            .inspect_err(|e| {
                error!(query = %params.query, keywords = ?params.keywords, error = %e, "similarity search failed");
            })
    }

    /// Statistics for every collection.
    pub async fn all_metrics(&self, refresh: bool) -> Result<Vec<CollectionStats>, ClientError> {
        self.get_json(&format!("/v1/metrics?refresh={refresh}"))
            .await
    }

    /// Statistics for one source's collection.
    pub async fn metrics(
        &self,
        source: Source,
        refresh: bool,
    ) -> Result<CollectionStats, ClientError> {
        self.get_json(&format!("/v1/metrics/{source}?refresh={refresh}"))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_similarity_search_body_and_results() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/search/similarity")
            .match_body(Matcher::Json(json!({
                "query": "rust async runtimes",
                "sources": ["twitter", "web"],
                "max_results": 10
            })))
            .with_status(200)
            .with_body(r#"[{"id":"d1","source":"web","content":"tokio","score":0.91}]"#)
            .create_async()
            .await;

        let params = SimilaritySearchParams {
            sources: vec![Source::Twitter, Source::Web],
            ..SimilaritySearchParams::new("rust async runtimes")
        };
        let client = test_client(&server.url(), None);
        let docs = client
            .similarity_search(&params)
            .await
            .unwrap_or_else(|e| panic!("search failed: {e}"));

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].score, Some(0.91));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_hybrid_search_wire_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/search/hybrid")
            .match_body(Matcher::PartialJson(json!({
                "text_query": {"query": "bitcoin", "weight": 0.7},
                "similarity_query": {"query": "crypto market outlook", "weight": 0.3},
                "max_results": 5
            })))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let params = HybridSearchParams {
            text_query: WeightedQuery {
                query: "bitcoin".to_string(),
                weight: 0.7,
            },
            similarity_query: WeightedQuery {
                query: "crypto market outlook".to_string(),
                weight: 0.3,
            },
            max_results: 5,
            ..HybridSearchParams::default()
        };
        let client = test_client(&server.url(), None);
        let docs = client
            .hybrid_search(&params)
            .await
            .unwrap_or_else(|e| panic!("search failed: {e}"));

        assert!(docs.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_metrics_paths() {
        let mut server = Server::new_async().await;
        let all = server
            .mock("GET", "/v1/metrics")
            .match_query(Matcher::UrlEncoded("refresh".into(), "true".into()))
            .with_status(200)
            .with_body(r#"[{"source":"twitter","count":10},{"source":"web","count":3}]"#)
            .create_async()
            .await;
        let one = server
            .mock("GET", "/v1/metrics/reddit")
            .match_query(Matcher::UrlEncoded("refresh".into(), "false".into()))
            .with_status(200)
            .with_body(r#"{"source":"reddit","count":7}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), None);
        let stats = client
            .all_metrics(true)
            .await
            .unwrap_or_else(|e| panic!("metrics failed: {e}"));
        assert_eq!(stats.len(), 2);

        let reddit = client
            .metrics(Source::Reddit, false)
            .await
            .unwrap_or_else(|e| panic!("metrics failed: {e}"));
        assert_eq!(reddit.get("count"), Some(&json!(7)));

        all.assert_async().await;
        one.assert_async().await;
    }

    #[tokio::test]
    async fn test_metrics_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/metrics")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = test_client(&server.url(), None);
        let result = client.all_metrics(false).await;

        assert!(matches!(result, Err(ClientError::Decode { .. })));
    }
}
