//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use confcache::{ConfigHandle, ConfigHandleBuilder, Overrides, WatchBackend, WatchMode};
use tempfile::TempDir;

/// A temporary directory with a canonical path, so resolved locations can be
/// compared directly.
pub struct Fixture {
    _dir: TempDir,
    root: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root as a search path string.
    pub fn path(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }

    /// Create (or overwrite) `relative` with `content`, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn mkdir(&self, relative: &str) -> String {
        let path = self.root.join(relative);
        fs::create_dir_all(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.root.join(relative)).unwrap();
    }
}

/// No overrides, manual watching, no default discovery.
pub fn builder() -> ConfigHandleBuilder {
    ConfigHandleBuilder::new()
        .overrides(Overrides::none())
        .watch_mode(WatchMode::Manual)
        .discovery(false)
        .log_errors(false)
}

pub fn handle(paths: &[&Fixture]) -> ConfigHandle {
    paths
        .iter()
        .fold(builder(), |b, fixture| b.search_path(fixture.path()))
        .build()
}

pub fn handle_with_backend(fixture: &Fixture, backend: Arc<dyn WatchBackend>) -> ConfigHandle {
    builder()
        .watch_mode(WatchMode::Custom(backend))
        .search_path(fixture.path())
        .build()
}
