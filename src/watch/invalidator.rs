//! Turns change events into cache evictions.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{ChangeEvent, ChangeKind, ChangeNotifier, WatchBackend};
use crate::cache::DocumentCache;
use crate::error::{ConfigError, Result};

/// Owns the change channel of one handle and the path → file name index.
pub struct Invalidator {
    backend: Arc<dyn WatchBackend>,
    notifier: ChangeNotifier,
    events: Mutex<mpsc::UnboundedReceiver<ChangeEvent>>,
    pending: Arc<AtomicUsize>,
    /// Watched path → logical file names that resolved to it.
    watched: DashMap<PathBuf, BTreeSet<String>>,
}

impl Invalidator {
    pub fn new(backend: Arc<dyn WatchBackend>) -> Self {
        let (notifier, events, pending) = ChangeNotifier::channel();
        Self {
            backend,
            notifier,
            events: Mutex::new(events),
            pending,
            watched: DashMap::new(),
        }
    }

    /// A sender for external change sources.
    pub fn notifier(&self) -> ChangeNotifier {
        self.notifier.clone()
    }

    /// Watch `path` on behalf of `name`. Idempotent by path: the backend is
    /// only asked once, later calls just record additional names.
    pub fn register(&self, path: &Path, name: &str) -> Result<()> {
        match self.watched.entry(path.to_path_buf()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().insert(name.to_string());
            }
            Entry::Vacant(entry) => {
                self.backend
                    .watch(path, self.notifier.clone())
                    .map_err(|source| ConfigError::Watch {
                        path: path.to_path_buf(),
                        source,
                    })?;
                entry.insert(BTreeSet::from([name.to_string()]));
            }
        }
        Ok(())
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.watched.contains_key(path)
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watched.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Apply every pending event to `cache`. Returns the number of evictions.
    ///
    /// Cheap when nothing is pending: a single atomic load.
    pub fn apply(&self, cache: &DocumentCache) -> usize {
        if self.pending.load(Ordering::Acquire) == 0 {
            return 0;
        }
        let mut events = self.events.lock();
        let mut evicted = 0;
        while let Ok(event) = events.try_recv() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            evicted += self.evict(cache, event);
        }
        evicted
    }

    fn evict(&self, cache: &DocumentCache, event: ChangeEvent) -> usize {
        let names: Vec<String> = match event.kind {
            ChangeKind::Modified => self
                .watched
                .get(&event.path)
                .map(|names| names.iter().cloned().collect())
                .unwrap_or_default(),
            ChangeKind::Removed => {
                let Some((path, names)) = self.watched.remove(&event.path) else {
                    return 0;
                };
                self.backend.unwatch(&path);
                names.into_iter().collect()
            }
        };
        if !names.is_empty() {
            tracing::info!(
                path = %event.path.display(),
                kind = ?event.kind,
                names = ?names,
                "configuration changed, evicting cached documents"
            );
        }
        names.iter().filter(|name| cache.remove(name)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::watch::ManualBackend;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    struct CountingBackend {
        calls: AtomicUsize,
    }

    impl WatchBackend for CountingBackend {
        fn watch(&self, _path: &Path, _on_change: ChangeNotifier) -> std::result::Result<(), notify::Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingBackend;

    impl WatchBackend for FailingBackend {
        fn watch(&self, _path: &Path, _on_change: ChangeNotifier) -> std::result::Result<(), notify::Error> {
            Err(notify::Error::generic("watch limit reached"))
        }
    }

    fn cached(cache: &DocumentCache, name: &str) {
        cache
            .get_or_compute(name, || Ok::<_, ()>(Document::from_value(json!({}))))
            .unwrap();
    }

    #[test]
    fn test_register_is_idempotent_by_path() {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        let invalidator = Invalidator::new(backend.clone());
        invalidator.register(Path::new("/etc/app/app.toml"), "app.toml").unwrap();
        invalidator.register(Path::new("/etc/app/app.toml"), "app.toml").unwrap();
        invalidator.register(Path::new("/etc/app/app.toml"), "app").unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(invalidator.watched_paths().len(), 1);
    }

    #[test]
    fn test_failed_registration_is_reported_and_not_recorded() {
        let invalidator = Invalidator::new(Arc::new(FailingBackend));
        let err = invalidator
            .register(Path::new("/etc/app/app.toml"), "app.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Watch { .. }));
        assert!(!invalidator.is_watched(Path::new("/etc/app/app.toml")));
    }

    #[test]
    fn test_modify_evicts_only_matching_names() {
        let cache = DocumentCache::new();
        let invalidator = Invalidator::new(Arc::new(ManualBackend));
        cached(&cache, "a.toml");
        cached(&cache, "b.toml");
        invalidator.register(Path::new("/cfg/a.toml"), "a.toml").unwrap();
        invalidator.register(Path::new("/cfg/b.toml"), "b.toml").unwrap();

        assert_eq!(invalidator.apply(&cache), 0);
        invalidator.notifier().notify("/cfg/a.toml", ChangeKind::Modified);
        invalidator.notifier().notify("/cfg/unrelated.toml", ChangeKind::Modified);
        assert_eq!(invalidator.apply(&cache), 1);

        assert!(!cache.contains("a.toml"));
        assert!(cache.contains("b.toml"));
        assert!(invalidator.is_watched(Path::new("/cfg/a.toml")));
    }

    #[test]
    fn test_remove_drops_watch() {
        let cache = DocumentCache::new();
        let invalidator = Invalidator::new(Arc::new(ManualBackend));
        cached(&cache, "a.toml");
        invalidator.register(Path::new("/cfg/a.toml"), "a.toml").unwrap();

        invalidator.notifier().notify("/cfg/a.toml", ChangeKind::Removed);
        assert_eq!(invalidator.apply(&cache), 1);
        assert!(!invalidator.is_watched(Path::new("/cfg/a.toml")));
    }
}
