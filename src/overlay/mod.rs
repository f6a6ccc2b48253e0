//! Read-only virtual file namespace consulted before the real filesystem.
//!
//! # Responsibilities
//! - Define the lookup contract the resolver consumes
//! - Provide an in-memory implementation for embedded assets and tests
//!
//! # Design Decisions
//! - Overlay paths are namespace strings, not real directories
//! - Directories are implied by the files beneath them
//! - Shared immutably (`Arc<dyn ResourceOverlay>`); nothing here mutates it

use std::collections::BTreeMap;
use std::sync::Arc;

/// One hit in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayFile {
    name: String,
    content: Option<Arc<[u8]>>,
}

impl OverlayFile {
    pub fn file(name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content: Some(content.into()),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
        }
    }

    /// Normalized path of the entry inside the overlay.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.content.is_none()
    }

    /// Decoded file bytes; empty for directories.
    pub fn content(&self) -> &[u8] {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Lookup contract for a virtual file bundle.
pub trait ResourceOverlay: Send + Sync {
    /// Look up a file or directory.
    fn get(&self, path: &str) -> Option<OverlayFile>;

    fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// An empty overlay is skipped entirely during resolution.
    fn is_empty(&self) -> bool;
}

/// A simple map-backed overlay.
///
/// ```
/// use confcache::overlay::{MapOverlay, ResourceOverlay};
///
/// let mut overlay = MapOverlay::new();
/// overlay.insert("config/app.toml", "name = \"demo\"");
/// assert!(overlay.get("/config").unwrap().is_dir());
/// assert_eq!(overlay.get("config/app.toml").unwrap().content(), b"name = \"demo\"");
/// ```
#[derive(Debug, Default, Clone)]
pub struct MapOverlay {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MapOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file with text content.
    pub fn insert(&mut self, path: &str, content: impl AsRef<str>) {
        self.insert_bytes(path, content.as_ref().as_bytes());
    }

    /// Insert a file with binary content.
    pub fn insert_bytes(&mut self, path: &str, content: impl Into<Arc<[u8]>>) {
        self.files.insert(normalize(path), content.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl ResourceOverlay for MapOverlay {
    fn get(&self, path: &str) -> Option<OverlayFile> {
        let path = normalize(path);
        if let Some(content) = self.files.get(&path) {
            return Some(OverlayFile::file(path, content.clone()));
        }
        let prefix = if path == "/" {
            path.clone()
        } else {
            format!("{path}/")
        };
        self.files
            .range(prefix.clone()..)
            .next()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|_| OverlayFile::directory(path))
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Rooted, single-slash, no trailing slash (except the root itself).
fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for part in path.split(['/', '\\']).filter(|part| !part.is_empty() && *part != ".") {
        out.push('/');
        out.push_str(part);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("config.toml"), "/config.toml");
        assert_eq!(normalize("//config//app.toml"), "/config/app.toml");
        assert_eq!(normalize("/config/"), "/config");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("./a"), "/a");
    }

    #[test]
    fn test_files_and_implied_directories() {
        let mut overlay = MapOverlay::new();
        overlay.insert("/etc/app/config.toml", "a = 1");

        let file = overlay.get("etc/app/config.toml").unwrap();
        assert!(!file.is_dir());
        assert_eq!(file.name(), "/etc/app/config.toml");
        assert_eq!(file.content(), b"a = 1");

        assert!(overlay.get("/etc/app").unwrap().is_dir());
        assert!(overlay.get("/etc/").unwrap().is_dir());
        assert!(overlay.get("/").unwrap().is_dir());
        assert!(overlay.get("/etc/ap").is_none());
        assert!(!overlay.contains("/etc/app/other.toml"));
    }

    #[test]
    fn test_empty_overlay() {
        let overlay = MapOverlay::new();
        assert!(overlay.is_empty());
        assert!(overlay.get("/").is_none());
    }
}
