//! Bounded estimate cache
//!
//! Keyed by a content-derived hash. Eviction is oldest-inserted-first once
//! the entry limit is reached; concurrent reads of completed entries are
//! safe behind the estimator's lock.

use std::collections::{HashMap, VecDeque};

use crate::TokenEstimate;

/// FIFO-bounded cache for token estimates
pub struct EstimateCache {
    entries: HashMap<String, TokenEstimate>,
    /// Insertion order for eviction
    order: VecDeque<String>,
    max_entries: usize,
}

impl EstimateCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Cache key for (path, content)
    pub fn key(path: &str, content: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(content.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    pub fn get(&self, key: &str) -> Option<&TokenEstimate> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, estimate: TokenEstimate) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, estimate);
            return;
        }
        while self.entries.len() >= self.max_entries {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, estimate);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(tokens: usize) -> TokenEstimate {
        TokenEstimate {
            total_tokens: tokens,
            ..TokenEstimate::failed("x", "stub")
        }
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut cache = EstimateCache::new(2);
        cache.insert("a".to_string(), estimate(1));
        cache.insert("b".to_string(), estimate(2));
        cache.insert("c".to_string(), estimate(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_key_depends_on_path_and_content() {
        let k1 = EstimateCache::key("a.ts", "content");
        let k2 = EstimateCache::key("b.ts", "content");
        let k3 = EstimateCache::key("a.ts", "other");
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
        assert_eq!(k1, EstimateCache::key("a.ts", "content"));
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let mut cache = EstimateCache::new(3);
        cache.insert("a".to_string(), estimate(1));
        cache.insert("a".to_string(), estimate(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().total_tokens, 2);
    }
}
