//! In-memory semantic cache with LRU eviction.

use super::{normalize_query, CacheStats, SimilarMatch};
use crate::config::CacheSettings;
use crate::retrieval::cosine_similarity;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A cached query with its embedding and payload.
#[derive(Debug, Clone)]
pub struct CacheEntry<R> {
    /// Literal cache key.
    pub key: String,
    /// Normalized form of the key.
    pub normalized_query: String,
    /// Embedding of the query. Never empty.
    pub embedding: Vec<f32>,
    /// Cached payload.
    pub result: R,
    /// Insertion sequence, used to break similarity ties.
    sequence: u64,
    /// Entries added with a TTL stop matching after this instant.
    expires_at: Option<Instant>,
}

impl<R> CacheEntry<R> {
    /// Whether the entry has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Cache keyed by query string with exact and similarity lookup.
///
/// Similarity lookup is a linear scan over all live entries (O(n * d)), which is
/// fine for the few thousand entries a single process holds.
pub struct SemanticCache<R> {
    entries: Mutex<LruCache<String, CacheEntry<R>>>,
    threshold: f32,
    max_entries: usize,
    next_sequence: AtomicU64,
    exact_hits: AtomicU64,
    semantic_hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<R: Clone> SemanticCache<R> {
    /// Create a cache with the given similarity threshold and capacity (0 = unbounded).
    pub fn new(threshold: f32, max_entries: usize) -> Self {
        let entries = match NonZeroUsize::new(max_entries) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };

        Self {
            entries: Mutex::new(entries),
            threshold,
            max_entries,
            next_sequence: AtomicU64::new(0),
            exact_hits: AtomicU64::new(0),
            semantic_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Create a cache from configuration.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.similarity_threshold, settings.max_entries)
    }

    /// Similarity threshold for semantic hits.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Look up an entry by its literal key.
    pub fn get_exact(&self, query: &str) -> Option<CacheEntry<R>> {
        let mut entries = self.entries.lock();

        let expired = entries.peek(query)?.is_expired();
        if expired {
            entries.pop(query);
            return None;
        }

        let entry = entries.get(query).cloned();
        if entry.is_some() {
            self.exact_hits.fetch_add(1, Ordering::Relaxed);
        }
        entry
    }

    /// Find the most similar entry at or above the threshold.
    pub fn find_similar(&self, embedding: &[f32]) -> Option<SimilarMatch<R>> {
        self.find_similar_where(embedding, |_| true)
    }

    /// Find the most similar entry whose key passes `filter`.
    ///
    /// Equal similarities resolve to the entry inserted first.
    pub fn find_similar_where<F>(&self, embedding: &[f32], filter: F) -> Option<SimilarMatch<R>>
    where
        F: Fn(&str) -> bool,
    {
        let mut entries = self.entries.lock();

        let mut best: Option<(&CacheEntry<R>, f32)> = None;
        for (key, entry) in entries.iter() {
            if entry.embedding.is_empty() || entry.is_expired() || !filter(key) {
                continue;
            }

            let similarity = cosine_similarity(embedding, &entry.embedding);
            if similarity < self.threshold {
                continue;
            }

            let better = match best {
                None => true,
                Some((current, best_similarity)) => {
                    similarity > best_similarity
                        || (similarity == best_similarity && entry.sequence < current.sequence)
                }
            };
            if better {
                best = Some((entry, similarity));
            }
        }

        let found = best.map(|(entry, similarity)| SimilarMatch {
            key: entry.key.clone(),
            result: entry.result.clone(),
            similarity,
        });

        match &found {
            Some(m) => {
                entries.promote(&m.key);
                self.semantic_hits.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        found
    }

    /// Insert or replace the entry for `query`.
    pub fn add(&self, query: &str, embedding: Vec<f32>, result: R) {
        self.insert(query, embedding, result, None);
    }

    /// Insert or replace the entry for `query`, expiring it after `ttl`.
    pub fn add_with_ttl(&self, query: &str, embedding: Vec<f32>, result: R, ttl: Duration) {
        self.insert(query, embedding, result, Some(Instant::now() + ttl));
    }

    fn insert(&self, query: &str, embedding: Vec<f32>, result: R, expires_at: Option<Instant>) {
        if embedding.is_empty() {
            warn!("Refusing to cache '{}' without an embedding", query);
            return;
        }

        let entry = CacheEntry {
            key: query.to_string(),
            normalized_query: normalize_query(query),
            embedding,
            result,
            sequence: self.next_sequence.fetch_add(1, Ordering::Relaxed),
            expires_at,
        };

        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(query.to_string(), entry) {
            if evicted != query {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Evicted least recently used cache entry '{}'", evicted);
            }
        }
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        entries.len()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> CacheStats {
        CacheStats {
            total_queries: self.size(),
            threshold: self.threshold,
            max_entries: self.max_entries,
            exact_hits: self.exact_hits.load(Ordering::Relaxed),
            semantic_hits: self.semantic_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

fn purge_expired<R>(entries: &mut LruCache<String, CacheEntry<R>>) {
    let expired: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| entry.is_expired())
        .map(|(key, _)| key.clone())
        .collect();
    for key in expired {
        entries.pop(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(threshold: f32) -> SemanticCache<String> {
        SemanticCache::new(threshold, 100)
    }

    #[test]
    fn test_exact_lookup() {
        let cache = cache(0.9);
        cache.add("What is a black hole?", vec![1.0, 0.0], "answer".to_string());

        let entry = cache.get_exact("What is a black hole?").unwrap();
        assert_eq!(entry.result, "answer");
        assert_eq!(entry.normalized_query, "what is a black hole");
        assert!(cache.get_exact("what is a black hole?").is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // cos([1, 0], [0.6, 0.8]) is exactly 0.6 in f32
        let probe = [1.0, 0.0];

        let at_threshold = cache(0.6);
        at_threshold.add("q", vec![0.6, 0.8], "a".to_string());
        let hit = at_threshold.find_similar(&probe).unwrap();
        assert_eq!(hit.key, "q");
        assert_eq!(hit.similarity, 0.6);

        let above_similarity = cache(0.600001);
        above_similarity.add("q", vec![0.6, 0.8], "a".to_string());
        assert!(above_similarity.find_similar(&probe).is_none());
    }

    #[test]
    fn test_highest_similarity_wins() {
        let cache = cache(0.5);
        cache.add("far", vec![0.6, 0.8], "far".to_string());
        cache.add("near", vec![0.8, 0.6], "near".to_string());

        let hit = cache.find_similar(&[1.0, 0.0]).unwrap();
        assert_eq!(hit.result, "near");
    }

    #[test]
    fn test_ties_resolve_to_first_inserted() {
        let cache = cache(0.5);
        cache.add("first", vec![2.0, 0.0], "first".to_string());
        cache.add("second", vec![1.0, 0.0], "second".to_string());
        // Touch "second" so it is most recently used; insertion order must still win.
        cache.get_exact("second");

        let hit = cache.find_similar(&[3.0, 0.0]).unwrap();
        assert_eq!(hit.key, "first");
    }

    #[test]
    fn test_filter_restricts_candidates() {
        let cache = cache(0.5);
        cache.add("X||MODE:normal", vec![1.0, 0.0], "normal".to_string());

        let hit = cache.find_similar_where(&[1.0, 0.0], |key| key.ends_with("||MODE:crazy_scientist"));
        assert!(hit.is_none());

        let hit = cache.find_similar_where(&[1.0, 0.0], |key| key.ends_with("||MODE:normal"));
        assert_eq!(hit.unwrap().result, "normal");
    }

    #[test]
    fn test_empty_embedding_is_not_stored() {
        let cache = cache(0.9);
        cache.add("q", Vec::new(), "a".to_string());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_re_adding_replaces_entry() {
        let cache = cache(0.9);
        cache.add("q", vec![1.0, 0.0], "old".to_string());
        cache.add("q", vec![0.0, 1.0], "new".to_string());

        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get_exact("q").unwrap().result, "new");
        assert_eq!(cache.get_stats().evictions, 0);
    }

    #[test]
    fn test_stats_round_trip() {
        let cache = cache(0.85);
        for i in 0..5 {
            cache.add(&format!("question {}", i), vec![1.0, i as f32], format!("a{}", i));
        }

        let stats = cache.get_stats();
        assert_eq!(stats.total_queries, 5);
        assert_eq!(stats.threshold, 0.85);

        cache.clear();
        assert_eq!(cache.get_stats().total_queries, 0);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let cache: SemanticCache<String> = SemanticCache::new(0.9, 2);
        cache.add("a", vec![1.0, 0.0], "a".to_string());
        cache.add("b", vec![0.0, 1.0], "b".to_string());
        // "a" becomes most recently used, so "b" is evicted next.
        assert!(cache.get_exact("a").is_some());
        cache.add("c", vec![1.0, 1.0], "c".to_string());

        assert_eq!(cache.size(), 2);
        assert!(cache.get_exact("b").is_none());
        assert!(cache.get_exact("a").is_some());
        assert!(cache.get_exact("c").is_some());
        assert_eq!(cache.get_stats().evictions, 1);
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let cache: SemanticCache<u32> = SemanticCache::new(0.9, 0);
        for i in 0..50 {
            cache.add(&i.to_string(), vec![1.0, i as f32], i);
        }
        assert_eq!(cache.size(), 50);
    }

    #[test]
    fn test_ttl_entries_expire() {
        let cache = cache(0.5);
        cache.add_with_ttl("err", vec![1.0, 0.0], "error".to_string(), Duration::ZERO);

        assert!(cache.get_exact("err").is_none());
        assert!(cache.find_similar(&[1.0, 0.0]).is_none());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_ttl_entries_live_until_deadline() {
        let cache = cache(0.5);
        cache.add_with_ttl("err", vec![1.0, 0.0], "error".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get_exact("err").unwrap().result, "error");
    }

    #[test]
    fn test_hit_counters() {
        let cache = cache(0.9);
        cache.add("q", vec![1.0, 0.0], "a".to_string());

        cache.get_exact("q");
        cache.find_similar(&[1.0, 0.0]);
        cache.find_similar(&[0.0, 1.0]);

        let stats = cache.get_stats();
        assert_eq!(stats.exact_hits, 1);
        assert_eq!(stats.semantic_hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
