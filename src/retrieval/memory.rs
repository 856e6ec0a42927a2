//! In-memory vector index.
//!
//! Useful for testing and for small knowledge bases exported to a JSON snapshot.

use super::{cosine_similarity, Passage, VectorIndex};
use crate::error::{AskrError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A passage together with its embedding, as stored in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedPassage {
    pub id: String,
    pub text: String,
    pub source_title: String,
    #[serde(default)]
    pub source: Option<String>,
    pub embedding: Vec<f32>,
}

/// In-memory vector index using a linear scan.
pub struct MemoryIndex {
    passages: RwLock<Vec<IndexedPassage>>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            passages: RwLock::new(Vec::new()),
        }
    }

    /// Load an index from a JSON snapshot (an array of passages with embeddings).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AskrError::Config(format!(
                "Knowledge snapshot not found at {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let passages: Vec<IndexedPassage> = serde_json::from_str(&content)?;
        info!("Loaded {} passages from {}", passages.len(), path.display());

        Ok(Self {
            passages: RwLock::new(passages),
        })
    }

    /// Insert or replace a passage by id.
    pub fn upsert(&self, passage: IndexedPassage) {
        let mut passages = self.passages.write();
        match passages.iter_mut().find(|p| p.id == passage.id) {
            Some(existing) => *existing = passage,
            None => passages.push(passage),
        }
    }

    /// Insert or replace several passages.
    pub fn upsert_batch(&self, batch: Vec<IndexedPassage>) -> usize {
        let count = batch.len();
        for passage in batch {
            self.upsert(passage);
        }
        count
    }

    /// Number of stored passages.
    pub fn len(&self) -> usize {
        self.passages.read().len()
    }

    /// Whether the index holds no passages.
    pub fn is_empty(&self) -> bool {
        self.passages.read().is_empty()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Passage>> {
        let passages = self.passages.read();

        let mut results: Vec<Passage> = passages
            .iter()
            .map(|p| Passage {
                id: p.id.clone(),
                text: p.text.clone(),
                score: cosine_similarity(embedding, &p.embedding),
                source_title: p.source_title.clone(),
                source: p.source.clone(),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        Ok(results)
    }

    async fn vector_count(&self) -> Result<Option<u64>> {
        Ok(Some(self.len() as u64))
    }
}
