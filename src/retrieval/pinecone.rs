//! Pinecone-hosted vector index over the data-plane REST API.

use super::{Passage, VectorIndex};
use crate::config::RetrievalSettings;
use crate::error::{AskrError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const API_VERSION: &str = "2024-07";

/// Pinecone index client.
pub struct PineconeIndex {
    http: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
    title_field: String,
    text_field: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: u64,
}

impl PineconeIndex {
    /// Create a client from configuration, reading the key from `PINECONE_API_KEY`.
    pub fn from_settings(settings: &RetrievalSettings) -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| AskrError::Config("PINECONE_API_KEY not set".to_string()))?;
        Self::new(settings, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn new(settings: &RetrievalSettings, api_key: String) -> Result<Self> {
        if settings.pinecone_host.is_empty() {
            return Err(AskrError::Config(
                "retrieval.pinecone_host is required for the pinecone provider".to_string(),
            ));
        }

        let host = if settings.pinecone_host.starts_with("http") {
            settings.pinecone_host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", settings.pinecone_host.trim_end_matches('/'))
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            host,
            api_key,
            namespace: settings.namespace.clone(),
            title_field: settings.title_field.clone(),
            text_field: settings.text_field.clone(),
        })
    }

    fn to_passages(&self, response: QueryResponse) -> Vec<Passage> {
        response
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m.metadata.unwrap_or_default();
                let field = |name: &str| metadata.get(name).and_then(Value::as_str).map(str::to_string);

                Passage {
                    text: field(&self.text_field).unwrap_or_else(|| "No content available".to_string()),
                    source_title: field(&self.title_field).unwrap_or_else(|| "Unknown".to_string()),
                    source: field("source"),
                    score: m.score,
                    id: m.id,
                }
            })
            .collect()
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        let response = self
            .http
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AskrError::Retrieval(format!(
                "Pinecone {} returned {}: {}",
                path, status, text
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    #[instrument(skip(self, embedding))]
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Passage>> {
        let request = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
        };

        let response: QueryResponse = self.post("/query", &request).await?;
        debug!("Pinecone returned {} matches", response.matches.len());

        Ok(self.to_passages(response))
    }

    async fn vector_count(&self) -> Result<Option<u64>> {
        let stats: IndexStats = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(Some(stats.total_vector_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(host: &str) -> RetrievalSettings {
        RetrievalSettings {
            pinecone_host: host.to_string(),
            ..RetrievalSettings::default()
        }
    }

    #[test]
    fn test_host_normalization() {
        let index = PineconeIndex::new(&settings("kb-abc.svc.pinecone.io/"), "key".into()).unwrap();
        assert_eq!(index.host, "https://kb-abc.svc.pinecone.io");

        let index = PineconeIndex::new(&settings("http://localhost:5080"), "key".into()).unwrap();
        assert_eq!(index.host, "http://localhost:5080");
    }

    #[test]
    fn test_missing_host_is_config_error() {
        let result = PineconeIndex::new(&settings(""), "key".into());
        assert!(matches!(result, Err(AskrError::Config(_))));
    }

    #[test]
    fn test_query_request_wire_shape() {
        let request = QueryRequest {
            vector: &[0.5, 0.25],
            top_k: 6,
            include_metadata: true,
            namespace: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 6);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_matches_to_passages() {
        let index = PineconeIndex::new(&settings("kb.example"), "key".into()).unwrap();
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "matches": [
                {
                    "id": "vid1-3",
                    "score": 0.82,
                    "metadata": {
                        "video_title": "What Happens Inside a Black Hole?",
                        "text": "Nothing escapes the event horizon.",
                        "source": "black_holes.txt"
                    }
                },
                { "id": "vid2-0", "score": 0.77 }
            ]
        }))
        .unwrap();

        let passages = index.to_passages(response);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].source_title, "What Happens Inside a Black Hole?");
        assert_eq!(passages[0].source.as_deref(), Some("black_holes.txt"));
        assert_eq!(passages[1].source_title, "Unknown");
        assert_eq!(passages[1].text, "No content available");
    }
}
