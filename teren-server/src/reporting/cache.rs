//! Report cache
//!
//! Short-lived cache in front of the transaction ledger, keyed by the
//! serialized filter parameters. Aggregate queries can span arbitrary date
//! ranges, so any ledger write that could move a total drops the whole
//! cache instead of guessing which keys it touched.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CacheEntry {
    stored_at: Instant,
    value: serde_json::Value,
}

/// TTL cache owned by the reporting aggregator. The settlement engine's
/// ledger-write hook points at [`ReportCache::invalidate_all`].
pub struct ReportCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cached value for a filter key, if still fresh
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        if let Some(entry) = self.entries.get(key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
        }
        // Expired entries are dropped lazily on the next lookup
        self.entries.remove(key);
        None
    }

    pub fn put(&self, key: String, value: serde_json::Value) {
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    /// Drop everything; called from the ledger-write path
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
