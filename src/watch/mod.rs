//! File change notification and cache invalidation.
//!
//! # Data Flow
//! ```text
//! document loaded from a real file
//!     → invalidator.rs registers the path (once per path)
//!     → backend.rs asks the OS watcher (notify) to watch it
//!
//! file edited:
//!     notify callback thread
//!     → ChangeNotifier (channel send only, no cache access)
//!     → next lookup on the owning handle drains the channel
//!     → invalidator.rs maps path → file names → cache eviction
//! ```
//!
//! # Design Decisions
//! - Watch callbacks never touch the cache; the owner applies events under
//!   its own locking discipline
//! - Watch failures degrade to "no auto-invalidation", never to a failed lookup
//! - Removal events drop the watch so a recreated file is watched again

mod backend;
mod invalidator;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::EventKind;
use tokio::sync::mpsc;

pub use backend::{ManualBackend, NotifyBackend};
pub use invalidator::Invalidator;

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Content changed or the file was (re)created.
    Modified,
    /// The file was removed or renamed away.
    Removed,
}

impl ChangeKind {
    /// Classify a raw notify event; access events are ignored.
    pub fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Removed),
            EventKind::Modify(_) | EventKind::Create(_) => Some(ChangeKind::Modified),
            _ => None,
        }
    }
}

/// A change to one watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Sending half of a handle's change channel.
///
/// Cheap to clone and safe to use from any thread, including watcher
/// callback threads.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: mpsc::UnboundedSender<ChangeEvent>,
    pending: Arc<AtomicUsize>,
}

impl ChangeNotifier {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<ChangeEvent>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        (
            Self {
                tx,
                pending: Arc::clone(&pending),
            },
            rx,
            pending,
        )
    }

    /// Report a change. Returns `false` if the owning handle is gone.
    pub fn notify(&self, path: impl Into<PathBuf>, kind: ChangeKind) -> bool {
        self.pending.fetch_add(1, Ordering::AcqRel);
        let sent = self
            .tx
            .send(ChangeEvent {
                path: path.into(),
                kind,
            })
            .is_ok();
        if !sent {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
        sent
    }

    /// Whether both notifiers feed the same handle.
    pub fn same_channel(&self, other: &ChangeNotifier) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

/// The filesystem-watch collaborator.
pub trait WatchBackend: Send + Sync {
    /// Start delivering changes of `path` to `on_change`.
    fn watch(&self, path: &Path, on_change: ChangeNotifier) -> Result<(), notify::Error>;

    /// Stop watching `path`. Best effort.
    fn unwatch(&self, _path: &Path) {}
}

/// How a handle learns about file changes.
#[derive(Clone, Default)]
pub enum WatchMode {
    /// OS notifications via `notify`.
    #[default]
    Notify,
    /// Only events pushed through [`ChangeNotifier`].
    Manual,
    /// A caller-supplied backend.
    Custom(Arc<dyn WatchBackend>),
}

impl WatchMode {
    pub(crate) fn backend(&self) -> Arc<dyn WatchBackend> {
        match self {
            WatchMode::Notify => Arc::new(NotifyBackend::new()),
            WatchMode::Manual => Arc::new(ManualBackend),
            WatchMode::Custom(backend) => Arc::clone(backend),
        }
    }
}

impl fmt::Debug for WatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchMode::Notify => f.write_str("Notify"),
            WatchMode::Manual => f.write_str("Manual"),
            WatchMode::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
