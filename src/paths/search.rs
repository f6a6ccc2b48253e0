//! Ordered, deduplicated set of search directories.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

/// Candidate directories, first match wins.
///
/// Readers take a snapshot and never observe a half-applied update; writers
/// are serialized and publish a complete new list.
#[derive(Debug)]
pub struct SearchPathSet {
    paths: ArcSwap<Vec<String>>,
    write: Mutex<()>,
}

impl SearchPathSet {
    pub fn new() -> Self {
        Self {
            paths: ArcSwap::from_pointee(Vec::new()),
            write: Mutex::new(()),
        }
    }

    /// Consistent view of the current list.
    pub fn snapshot(&self) -> Arc<Vec<String>> {
        self.paths.load_full()
    }

    pub fn len(&self) -> usize {
        self.paths.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.load().is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.load().iter().any(|p| p == path)
    }

    /// Append `path`; returns `false` for empty or already present entries.
    pub fn push(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let _guard = self.write.lock();
        let current = self.paths.load();
        if current.iter().any(|p| p == path) {
            return false;
        }
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(path.to_string());
        self.paths.store(Arc::new(next));
        true
    }

    /// Replace the whole list with a single entry.
    pub fn replace(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let _guard = self.write.lock();
        self.paths.store(Arc::new(vec![path.to_string()]));
        true
    }
}

impl Default for SearchPathSet {
    fn default() -> Self {
        Self::new()
    }
}
