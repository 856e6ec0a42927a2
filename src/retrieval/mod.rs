//! Passage retrieval over an external vector index.
//!
//! The index itself is abstracted behind [`VectorIndex`]; [`KnowledgeRetriever`]
//! adds query embedding, the relevance floor and the top-K cut on top of it.

mod memory;
mod pinecone;

pub use memory::MemoryIndex;
pub use pinecone::PineconeIndex;

use crate::config::{RetrievalProvider, Settings};
use crate::embedding::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A knowledge-base passage returned by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Index-assigned identifier.
    pub id: String,
    /// Passage text.
    pub text: String,
    /// Relevance score (higher is better).
    pub score: f32,
    /// Title of the video the passage comes from.
    pub source_title: String,
    /// Source file or URL, when the index stores one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` passages nearest to `embedding`, best first.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Passage>>;

    /// Number of vectors in the index, if the backend can tell.
    async fn vector_count(&self) -> Result<Option<u64>>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths, empty input, or a zero-magnitude vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Retrieves relevant passages for a question.
pub struct KnowledgeRetriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    relevance_floor: f32,
    candidate_multiplier: usize,
}

impl KnowledgeRetriever {
    /// Create a new retriever with default limits.
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            top_k: 3,
            relevance_floor: 0.75,
            candidate_multiplier: 2,
        }
    }

    /// Set the maximum number of passages returned.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum relevance score.
    pub fn with_relevance_floor(mut self, relevance_floor: f32) -> Self {
        self.relevance_floor = relevance_floor;
        self
    }

    /// Set how many candidates are fetched per kept passage.
    pub fn with_candidate_multiplier(mut self, multiplier: usize) -> Self {
        self.candidate_multiplier = multiplier.max(1);
        self
    }

    /// Get the underlying index.
    pub fn index(&self) -> Arc<dyn VectorIndex> {
        self.index.clone()
    }

    /// Embed `query` and return the passages above the relevance floor, best first.
    #[instrument(skip(self), fields(top_k = self.top_k))]
    pub async fn search(&self, query: &str) -> Result<Vec<Passage>> {
        let embedding = self.embedder.embed(query).await?;
        self.search_embedding(&embedding).await
    }

    /// Search with a precomputed query embedding.
    pub async fn search_embedding(&self, embedding: &[f32]) -> Result<Vec<Passage>> {
        let candidates = self
            .index
            .query(embedding, self.top_k * self.candidate_multiplier)
            .await?;
        let fetched = candidates.len();

        let passages = filter_passages(candidates, self.relevance_floor, self.top_k);
        debug!("Kept {} of {} candidate passages", passages.len(), fetched);

        Ok(passages)
    }
}

/// Keep passages scoring at least `floor`, truncated to `top_k`.
pub fn filter_passages(passages: Vec<Passage>, floor: f32, top_k: usize) -> Vec<Passage> {
    let mut kept: Vec<Passage> = passages.into_iter().filter(|p| p.score >= floor).collect();
    kept.truncate(top_k);
    kept
}

/// Build the configured vector index.
pub fn create_index(settings: &Settings) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match settings.retrieval.provider {
        RetrievalProvider::Pinecone => Arc::new(PineconeIndex::from_settings(&settings.retrieval)?),
        RetrievalProvider::Memory => Arc::new(MemoryIndex::load(&settings.snapshot_path())?),
    };
    Ok(index)
}
