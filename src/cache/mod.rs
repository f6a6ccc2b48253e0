//! Document cache with compute-once semantics per file name.
//!
//! # Responsibilities
//! - Map logical file names to parsed documents
//! - Run at most one computation per key at a time
//! - Evict single keys (invalidation) or everything (path switch, flag flip)
//!
//! # Design Decisions
//! - Entries live in a sharded `DashMap`, so hits never contend on a global lock
//! - Misses serialize on a per-key mutex from a lazily grown arena; computing
//!   one key never blocks readers or writers of another. Arena slots are
//!   pruned once no caller holds them
//! - Failures are returned but never stored, the next call retries
//! - `clear()` bumps a generation and `remove()` bumps a per-key epoch; a
//!   computation that started before either hands its result to its callers
//!   but does not store it
//! - Hits read under the generation lock, so `clear_with` publishes its
//!   side effect and the empty cache as one step

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::document::Document;
use crate::observability::metrics;

/// Thread-safe map of file name → shared document.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: DashMap<String, Arc<Document>>,
    /// One exclusivity scope per key, created on first miss and pruned when idle.
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// Bumped by `remove`; absent means zero.
    epochs: DashMap<String, u64>,
    generation: RwLock<u64>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached document, if any.
    pub fn get(&self, name: &str) -> Option<Arc<Document>> {
        let _generation = self.generation.read();
        self.entries.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached document or compute, store and return it.
    ///
    /// Concurrent callers for the same `name` wait for the single running
    /// computation and share its result. Errors are not cached.
    pub fn get_or_compute<E, F>(&self, name: &str, compute: F) -> Result<Arc<Document>, E>
    where
        F: FnOnce() -> Result<Document, E>,
    {
        if let Some(doc) = self.get(name) {
            metrics::record_cache_hit();
            return Ok(doc);
        }

        let result = {
            let lock = Arc::clone(&self.locks.entry(name.to_string()).or_default());
            let _guard = lock.lock();
            self.compute_locked(name, compute)
        };
        self.locks
            .remove_if(name, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn compute_locked<E, F>(&self, name: &str, compute: F) -> Result<Arc<Document>, E>
    where
        F: FnOnce() -> Result<Document, E>,
    {
        // Another caller may have filled the entry while we waited.
        if let Some(doc) = self.get(name) {
            metrics::record_cache_hit();
            return Ok(doc);
        }
        metrics::record_cache_miss();

        let started = *self.generation.read();
        let epoch = self.epoch(name);
        let doc = Arc::new(compute()?);

        let generation = self.generation.read();
        // Holding the epoch shard orders this insert against `remove`.
        let current = self.epochs.get(name);
        let current_epoch = current.as_deref().copied().unwrap_or(0);
        if *generation == started && current_epoch == epoch {
            self.entries.insert(name.to_string(), Arc::clone(&doc));
        } else {
            tracing::debug!(name, "cache invalidated during load, result not stored");
        }
        Ok(doc)
    }

    fn epoch(&self, name: &str) -> u64 {
        self.epochs.get(name).map(|epoch| *epoch).unwrap_or(0)
    }

    /// Evict one entry, including a result still being computed for it.
    /// Returns whether something was cached.
    pub fn remove(&self, name: &str) -> bool {
        let removed = {
            let mut epoch = self.epochs.entry(name.to_string()).or_insert(0);
            *epoch += 1;
            self.entries.remove(name).is_some()
        };
        if removed {
            metrics::record_invalidation();
            tracing::debug!(name, "cache entry evicted");
        }
        removed
    }

    /// Evict everything, including results of loads still in flight.
    pub fn clear(&self) {
        self.clear_with(|| ());
    }

    /// Run `update` and evict everything as one step: no lookup observes
    /// the update while old entries are still served.
    pub fn clear_with<R>(&self, update: impl FnOnce() -> R) -> R {
        let mut generation = self.generation.write();
        let result = update();
        *generation += 1;
        self.entries.clear();
        self.epochs.clear();
        tracing::debug!(generation = *generation, "cache cleared");
        result
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names currently cached, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(value)
    }

    #[test]
    fn test_cache_operations() {
        let cache = DocumentCache::new();
        assert!(cache.get("a.json").is_none());

        let first = cache
            .get_or_compute("a.json", || Ok::<_, ()>(doc(json!({"v": 1}))))
            .unwrap();
        let second = cache
            .get_or_compute("a.json", || -> Result<Document, ()> {
                panic!("should be served from cache")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        assert!(cache.remove("a.json"));
        assert!(!cache.remove("a.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);

        let result = cache.get_or_compute("a.json", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("broken")
        });
        assert_eq!(result.unwrap_err(), "broken");
        assert!(!cache.contains("a.json"));

        let result = cache.get_or_compute("a.json", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, &str>(doc(json!({})))
        });
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_leaves_other_keys() {
        let cache = DocumentCache::new();
        cache.get_or_compute("a", || Ok::<_, ()>(doc(json!(1)))).unwrap();
        cache.get_or_compute("b", || Ok::<_, ()>(doc(json!(2)))).unwrap();
        cache.remove("a");
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert_eq!(cache.names(), vec!["b".to_string()]);
    }

    #[test]
    fn test_clear_during_compute_discards_result() {
        let cache = DocumentCache::new();
        let result = cache
            .get_or_compute("a", || {
                cache.clear();
                Ok::<_, ()>(doc(json!({"stale": true})))
            })
            .unwrap();
        assert_eq!(result.get_string("stale"), "true");
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_remove_during_compute_discards_result() {
        let cache = DocumentCache::new();
        let result = cache
            .get_or_compute("a", || {
                // Nothing is stored yet, but the eviction must still win.
                assert!(!cache.remove("a"));
                Ok::<_, ()>(doc(json!({"stale": true})))
            })
            .unwrap();
        assert!(result.get_bool("stale"));
        assert!(!cache.contains("a"));

        cache.get_or_compute("a", || Ok::<_, ()>(doc(json!({})))).unwrap();
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_clear_with_hides_old_entries_from_concurrent_readers() {
        let cache = Arc::new(DocumentCache::new());
        cache.get_or_compute("a", || Ok::<_, ()>(doc(json!("old")))).unwrap();

        let seen = cache.clear_with(|| {
            let reader = {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get("a"))
            };
            std::thread::sleep(std::time::Duration::from_millis(50));
            reader
        });
        assert!(seen.join().unwrap().is_none());
    }

    #[test]
    fn test_lock_arena_is_pruned() {
        let cache = DocumentCache::new();
        cache.get_or_compute("a", || Ok::<_, ()>(doc(json!(1)))).unwrap();
        let _ = cache.get_or_compute("b", || Err::<Document, _>("missing"));
        assert!(cache.locks.is_empty());
    }
}
