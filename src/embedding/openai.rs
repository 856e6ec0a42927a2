//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{AskrError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    /// Explicitly requested size; `None` lets the model pick its native size.
    requested_dimensions: Option<u32>,
}

impl OpenAIEmbedder {
    /// Create an embedder for the given model.
    pub fn new(model: &str, requested_dimensions: Option<u32>) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            requested_dimensions,
        })
    }

    /// Create an embedder from configuration.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        if settings.provider != "openai" {
            return Err(AskrError::Config(format!(
                "Unsupported embedding provider: {}",
                settings.provider
            )));
        }
        Self::new(&settings.model, settings.dimensions)
    }
}

/// Native vector size of the known OpenAI embedding models.
fn native_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AskrError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        // OpenAI limits the batch size
        const BATCH_SIZE: usize = 100;
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let mut args = CreateEmbeddingRequestArgs::default();
            args.model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()));
            if let Some(dimensions) = self.requested_dimensions {
                args.dimensions(dimensions);
            }
            let request = args
                .build()
                .map_err(|e| AskrError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self.client.embeddings().create(request).await.map_err(|e| {
                AskrError::OpenAI(format!("Embedding API error: {}", e))
            })?;

            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);

            all_embeddings.extend(embeddings.into_iter().map(|e| e.embedding));
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.requested_dimensions
            .map(|d| d as usize)
            .unwrap_or_else(|| native_dimensions(&self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_dimensions() {
        let embedder = OpenAIEmbedder::new("text-embedding-ada-002", None).unwrap();
        assert_eq!(embedder.dimensions(), 1536);

        let embedder = OpenAIEmbedder::new("text-embedding-3-large", None).unwrap();
        assert_eq!(embedder.dimensions(), 3072);

        let embedder = OpenAIEmbedder::new("text-embedding-3-small", Some(512)).unwrap();
        assert_eq!(embedder.dimensions(), 512);
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let settings = EmbeddingSettings {
            provider: "cohere".to_string(),
            ..EmbeddingSettings::default()
        };
        assert!(OpenAIEmbedder::from_settings(&settings).is_err());
    }
}
