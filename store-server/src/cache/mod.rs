//! In-process response cache
//!
//! Keyed by resource path, invalidated with trailing-`*` prefix patterns on
//! every product mutation. A disposable projection like the search index:
//! losing it costs latency, never correctness.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Shared cache handle
#[derive(Clone)]
pub struct CacheService {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl CacheService {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Fetch a cached value; expired entries are dropped on access
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store a value with the given lifetime
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove a single key
    pub fn del(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove every key matching the pattern. A trailing `*` matches any
    /// suffix; anything else is an exact key. Returns the number of evicted
    /// entries.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        match pattern.strip_suffix('*') {
            Some(prefix) => {
                let before = self.entries.len();
                self.entries.retain(|key, _| !key.starts_with(prefix));
                before - self.entries.len()
            }
            None => usize::from(self.entries.remove(pattern).is_some()),
        }
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_set_roundtrip() {
        let cache = CacheService::new();
        cache.set("products:p1", json!({"items": []}), DEFAULT_TTL);
        assert_eq!(cache.get("products:p1"), Some(json!({"items": []})));
        assert_eq!(cache.get("products:p2"), None);
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = CacheService::new();
        cache.set("k", json!(1), Duration::from_secs(0));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_del() {
        let cache = CacheService::new();
        cache.set("k", json!(1), DEFAULT_TTL);
        cache.del("k");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_invalidate_prefix_pattern() {
        let cache = CacheService::new();
        cache.set("products:p1", json!(1), DEFAULT_TTL);
        cache.set("products:p2", json!(2), DEFAULT_TTL);
        cache.set("search:mouse", json!(3), DEFAULT_TTL);

        let evicted = cache.invalidate_pattern("products:*");
        assert_eq!(evicted, 2);
        assert_eq!(cache.get("products:p1"), None);
        assert_eq!(cache.get("search:mouse"), Some(json!(3)));
    }

    #[test]
    fn test_invalidate_exact_pattern() {
        let cache = CacheService::new();
        cache.set("search:mouse", json!(1), DEFAULT_TTL);
        assert_eq!(cache.invalidate_pattern("search:mouse"), 1);
        assert_eq!(cache.invalidate_pattern("search:mouse"), 0);
    }
}
