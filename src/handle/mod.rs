//! The public facade: one set of search paths, one cache, one watcher.
//!
//! # Responsibilities
//! - Path management (`add_path`, `set_path`)
//! - Serve documents by file name through the cache
//! - Apply queued change events before every lookup
//! - Zero-value accessors against the default file
//!
//! # Data Flow
//! ```text
//! handle.get_string("http.addr")
//!     → invalidator.apply(cache)          pending change events first
//!     → cache.get_or_compute(name)        hit returns here
//!     → load(name)
//!         inline content?  → sniff + parse
//!         PathResolver     → overlay bytes | fs::read
//!         strip BOM, parse by extension or sniff
//!         disk file        → invalidator.register(path, name)
//!     → Document::get_string
//! ```
//!
//! # Design Decisions
//! - Documents record the violence-check flag at load time, so flipping it
//!   clears the cache
//! - Failing to watch never fails a lookup

mod builder;

use std::fmt;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::cache::DocumentCache;
use crate::content::InlineContent;
use crate::document::{Document, Format, FormatError, Origin};
use crate::error::{ConfigError, Result};
use crate::observability::metrics;
use crate::overlay::ResourceOverlay;
use crate::paths::{PathResolver, Resolved, SearchPathSet};
use crate::watch::{ChangeNotifier, Invalidator, WatchBackend};

pub use builder::ConfigHandleBuilder;

/// Configuration access for one application component.
pub struct ConfigHandle {
    default_name: ArcSwap<String>,
    search_paths: SearchPathSet,
    cache: DocumentCache,
    violence_check: AtomicBool,
    overlay: Option<Arc<dyn ResourceOverlay>>,
    inline: Arc<InlineContent>,
    invalidator: Invalidator,
    log_errors: bool,
}

impl ConfigHandle {
    pub fn builder() -> ConfigHandleBuilder {
        ConfigHandleBuilder::new()
    }

    fn new(
        default_name: String,
        overlay: Option<Arc<dyn ResourceOverlay>>,
        inline: Arc<InlineContent>,
        backend: Arc<dyn WatchBackend>,
        log_errors: bool,
        violence_check: bool,
    ) -> Self {
        Self {
            default_name: ArcSwap::from_pointee(default_name),
            search_paths: SearchPathSet::new(),
            cache: DocumentCache::new(),
            violence_check: AtomicBool::new(violence_check),
            overlay,
            inline,
            invalidator: Invalidator::new(backend),
            log_errors,
        }
    }

    // ---- search paths ----

    /// Append a directory to the search paths. No-op if already present.
    pub fn add_path(&self, path: &str) -> Result<()> {
        let dir = self.resolve_directory(path)?;
        if self.search_paths.push(&dir) {
            tracing::info!(path = %dir, "search path added");
        }
        Ok(())
    }

    /// Replace the search paths with a single directory and clear the cache.
    pub fn set_path(&self, path: &str) -> Result<()> {
        let dir = self.resolve_directory(path)?;
        self.cache.clear_with(|| self.search_paths.replace(&dir));
        tracing::info!(path = %dir, "search path set");
        Ok(())
    }

    /// Used by default discovery, where missing directories are expected.
    pub(crate) fn add_path_quietly(&self, path: &str) {
        let snapshot = self.search_paths.snapshot();
        let resolver = PathResolver::new(&snapshot, self.overlay.as_deref());
        if let Ok(dir) = resolver.resolve_directory(path) {
            self.search_paths.push(&dir);
        }
    }

    fn resolve_directory(&self, path: &str) -> Result<String> {
        let snapshot = self.search_paths.snapshot();
        let resolver = PathResolver::new(&snapshot, self.overlay.as_deref());
        resolver.resolve_directory(path).inspect_err(|e| {
            if self.log_errors {
                tracing::error!(path, error = %e, "invalid search path");
            }
        })
    }

    pub fn search_paths(&self) -> Vec<String> {
        self.search_paths.snapshot().to_vec()
    }

    // ---- file names ----

    pub fn file_name(&self) -> String {
        self.default_name.load().as_str().to_string()
    }

    pub fn set_file_name(&self, name: impl Into<String>) {
        self.default_name.store(Arc::new(name.into()));
    }

    fn name_or_default(&self, name: &str) -> String {
        if name.is_empty() {
            self.file_name()
        } else {
            name.to_string()
        }
    }

    /// Where `name` resolves to, without reading it. Empty means the default file.
    pub fn resolve(&self, name: &str) -> Option<Resolved> {
        let name = self.name_or_default(name);
        let snapshot = self.search_paths.snapshot();
        PathResolver::new(&snapshot, self.overlay.as_deref()).resolve(&name)
    }

    /// Location `name` resolves to, `None` when absent.
    pub fn file_path(&self, name: &str) -> Option<String> {
        self.resolve(name).map(|found| found.location())
    }

    /// Whether `name` has inline content or resolves to a file.
    pub fn available(&self, name: &str) -> bool {
        let name = self.name_or_default(name);
        self.inline.contains(&name) || self.resolve(&name).is_some()
    }

    // ---- documents ----

    /// Document of the default file.
    pub fn document(&self) -> Result<Arc<Document>> {
        self.document_of("")
    }

    /// Document of `name`, loaded on first use and cached until invalidated.
    pub fn document_of(&self, name: &str) -> Result<Arc<Document>> {
        let name = self.name_or_default(name);
        self.invalidator.apply(&self.cache);
        self.cache.get_or_compute(&name, || self.load(&name))
    }

    fn load(&self, name: &str) -> Result<Document> {
        let violence_check = self.violence_check.load(Ordering::Acquire);

        if let Some(content) = self.inline.get(name) {
            tracing::debug!(name, "loading inline content");
            return self
                .parse(name, content.as_bytes(), None)
                .map(|doc| doc.with_origin(Origin::Inline).with_violence_check(violence_check));
        }

        let snapshot = self.search_paths.snapshot();
        let resolver = PathResolver::new(&snapshot, self.overlay.as_deref());
        let Some(found) = resolver.resolve(name) else {
            return Err(ConfigError::FileNotAvailable {
                name: name.to_string(),
                searched: snapshot.to_vec(),
            });
        };
        tracing::debug!(name, location = %found.location(), "loading configuration file");

        let format = Format::from_name(name);
        match found {
            Resolved::Overlay(file) => {
                let doc = self.parse(file.name(), file.content(), format)?;
                Ok(doc
                    .with_origin(Origin::Overlay(file.name().to_string()))
                    .with_violence_check(violence_check))
            }
            Resolved::Disk(path) => {
                let bytes = fs::read(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                let doc = self.parse(&path.to_string_lossy(), &bytes, format)?;
                if let Err(e) = self.invalidator.register(&path, name) {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "serving configuration without change notifications"
                    );
                }
                Ok(doc
                    .with_origin(Origin::File(path))
                    .with_violence_check(violence_check))
            }
        }
    }

    fn parse(&self, source_name: &str, bytes: &[u8], format: Option<Format>) -> Result<Document> {
        let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
        let parsed = match std::str::from_utf8(bytes) {
            Ok(content) => Document::parse(content, format),
            Err(e) => Err(FormatError {
                format,
                message: format!("invalid UTF-8: {e}"),
            }),
        };
        parsed.map_err(|error| {
            tracing::error!(source = source_name, error = %error, "failed to parse configuration");
            metrics::record_parse_failure(error.format.map_or("unknown", Format::extension));
            ConfigError::Parse {
                source_name: source_name.to_string(),
                error,
            }
        })
    }

    /// Drop every cached document.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Whether `name` currently has a cached document.
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains(&self.name_or_default(name))
    }

    pub(crate) fn evict(&self, name: &str) {
        self.cache.remove(name);
    }

    // ---- inline content ----

    /// Register inline content for `name`; it takes precedence over files.
    ///
    /// An empty name means this handle's current default file name. A load
    /// of `name` already in flight is not cached.
    pub fn set_content(&self, name: &str, content: impl Into<Arc<str>>) {
        let name = self.name_or_default(name);
        self.inline.set(&name, content);
        self.cache.remove(&name);
    }

    /// Drop inline content for `name`; empty means the default file name.
    pub fn remove_content(&self, name: &str) {
        let name = self.name_or_default(name);
        if self.inline.remove(&name) {
            self.cache.remove(&name);
        }
    }

    // ---- flags & notifications ----

    pub fn violence_check(&self) -> bool {
        self.violence_check.load(Ordering::Acquire)
    }

    /// Switch exhaustive key matching. Changing the flag clears the cache.
    pub fn set_violence_check(&self, enabled: bool) {
        if self.violence_check.swap(enabled, Ordering::AcqRel) != enabled {
            self.cache.clear();
            tracing::debug!(enabled, "violence check toggled");
        }
    }

    /// Sender for change events, for external change sources.
    pub fn change_notifier(&self) -> ChangeNotifier {
        self.invalidator.notifier()
    }

    // ---- accessors on the default file ----

    fn with_default<T>(&self, f: impl FnOnce(&Document) -> T) -> Result<T> {
        self.document().map(|doc| f(&doc))
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.with_default(|doc| doc.get(key).cloned())
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        self.with_default(|doc| doc.contains(key))
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.with_default(|doc| doc.get_string(key))
    }

    pub fn get_strings(&self, key: &str) -> Result<Vec<String>> {
        self.with_default(|doc| doc.get_strings(key))
    }

    pub fn get_array(&self, key: &str) -> Result<Vec<Value>> {
        self.with_default(|doc| doc.get_array(key))
    }

    pub fn get_map(&self, key: &str) -> Result<Map<String, Value>> {
        self.with_default(|doc| doc.get_map(key))
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.with_default(|doc| doc.get_int(key))
    }

    pub fn get_uint(&self, key: &str) -> Result<u64> {
        self.with_default(|doc| doc.get_uint(key))
    }

    pub fn get_float(&self, key: &str) -> Result<f64> {
        self.with_default(|doc| doc.get_float(key))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.with_default(|doc| doc.get_bool(key))
    }

    pub fn get_struct<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.document()?.get_struct(key)
    }

    pub fn dump(&self) -> Result<String> {
        self.with_default(Document::dump)
    }
}

impl fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("file_name", &self.file_name())
            .field("search_paths", &self.search_paths.snapshot())
            .field("cached", &self.cache.len())
            .field("violence_check", &self.violence_check())
            .field("overlay", &self.overlay.is_some())
            .finish()
    }
}
