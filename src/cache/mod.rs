//! Semantic answer cache.
//!
//! Answers are looked up first by their literal key and then by cosine similarity
//! of the question embedding, so paraphrased questions reuse earlier work.

mod flight;
mod semantic;

pub use flight::{KeyGuard, KeyedLocks};
pub use semantic::{CacheEntry, SemanticCache};

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// A similarity hit.
#[derive(Debug, Clone)]
pub struct SimilarMatch<R> {
    /// Key of the matched entry.
    pub key: String,
    /// Cached payload.
    pub result: R,
    /// Cosine similarity between the probe and the stored embedding.
    pub similarity: f32,
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of live entries.
    pub total_queries: usize,
    /// Similarity threshold for semantic hits.
    pub threshold: f32,
    /// Capacity (0 = unbounded).
    pub max_entries: usize,
    pub exact_hits: u64,
    pub semantic_hits: u64,
    /// Similarity searches that found nothing.
    pub misses: u64,
    pub evictions: u64,
}

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("Invalid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Normalize query text for matching: lowercase, no punctuation, single spaces.
pub fn normalize_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    let stripped = PUNCTUATION.replace_all(lowered.trim(), "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
