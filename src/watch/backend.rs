//! Watch backends: OS notifications via `notify`, or manual delivery only.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::{ChangeKind, ChangeNotifier, WatchBackend};

type Routes = Arc<DashMap<PathBuf, Vec<ChangeNotifier>>>;

/// Watches files with the platform's recommended watcher.
///
/// The OS watcher is created on the first `watch` call. Events are routed
/// by path to every notifier registered for it, so one backend can serve
/// several handles.
pub struct NotifyBackend {
    watcher: Mutex<Option<RecommendedWatcher>>,
    routes: Routes,
    poll_interval: Duration,
}

impl NotifyBackend {
    pub fn new() -> Self {
        Self::with_poll_interval(Duration::from_secs(2))
    }

    /// Poll interval used when the platform falls back to polling.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            watcher: Mutex::new(None),
            routes: Arc::new(DashMap::new()),
            poll_interval,
        }
    }

    fn spawn_watcher(&self) -> Result<RecommendedWatcher, notify::Error> {
        let routes = Arc::clone(&self.routes);
        RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let Some(kind) = ChangeKind::from_event(&event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        if let Some(notifiers) = routes.get(&path) {
                            tracing::debug!(path = %path.display(), ?kind, "configuration file changed");
                            for notifier in notifiers.iter() {
                                notifier.notify(path.clone(), kind);
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )
    }
}

impl Default for NotifyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&self, path: &Path, on_change: ChangeNotifier) -> Result<(), notify::Error> {
        let mut slot = self.watcher.lock();
        if slot.is_none() {
            *slot = Some(self.spawn_watcher()?);
        }
        if let Some(watcher) = slot.as_mut() {
            watcher.watch(path, RecursiveMode::NonRecursive)?;
        }

        let mut notifiers = self.routes.entry(path.to_path_buf()).or_default();
        if !notifiers.iter().any(|n| n.same_channel(&on_change)) {
            notifiers.push(on_change);
        }
        tracing::debug!(path = %path.display(), "Config watcher started");
        Ok(())
    }

    fn unwatch(&self, path: &Path) {
        self.routes.remove(path);
        if let Some(watcher) = self.watcher.lock().as_mut() {
            if let Err(e) = watcher.unwatch(path) {
                tracing::debug!(path = %path.display(), error = %e, "unwatch failed");
            }
        }
    }
}

/// Accepts every registration; changes arrive only through
/// [`ChangeNotifier::notify`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualBackend;

impl WatchBackend for ManualBackend {
    fn watch(&self, _path: &Path, _on_change: ChangeNotifier) -> Result<(), notify::Error> {
        Ok(())
    }
}
