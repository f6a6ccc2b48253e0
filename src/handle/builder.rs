//! Construction of [`ConfigHandle`]s.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ConfigHandle;
use crate::content::{InlineContent, DEFAULT_CONFIG_FILE};
use crate::overlay::ResourceOverlay;
use crate::overrides::Overrides;
use crate::watch::WatchMode;

/// Fluent builder for a [`ConfigHandle`].
///
/// Search paths are established in this order:
/// 1. `confcache.path` override, when it names an existing directory
/// 2. explicit [`search_path`](Self::search_path) entries
/// 3. default discovery, only when neither of the above produced a path:
///    `CARGO_MANIFEST_DIR`, the executable's directory, the working directory
#[derive(Clone, Default)]
pub struct ConfigHandleBuilder {
    file_name: Option<String>,
    search_paths: Vec<String>,
    overlay: Option<Arc<dyn ResourceOverlay>>,
    inline: Option<Arc<InlineContent>>,
    overrides: Option<Overrides>,
    watch_mode: WatchMode,
    log_errors: Option<bool>,
    violence_check: bool,
    discovery: Option<bool>,
}

impl ConfigHandleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default file name; `confcache.file` is only consulted when unset.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn overlay(mut self, overlay: Arc<dyn ResourceOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Share an inline content store, e.g. with other handles of a registry.
    pub fn inline_content(mut self, store: Arc<InlineContent>) -> Self {
        self.inline = Some(store);
        self
    }

    /// Use these overrides instead of reading the process arguments and
    /// environment.
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn watch_mode(mut self, mode: WatchMode) -> Self {
        self.watch_mode = mode;
        self
    }

    /// Log path-set errors at error level. Defaults to `confcache.errorprint`,
    /// or on.
    pub fn log_errors(mut self, enabled: bool) -> Self {
        self.log_errors = Some(enabled);
        self
    }

    pub fn violence_check(mut self, enabled: bool) -> Self {
        self.violence_check = enabled;
        self
    }

    /// Force default discovery on or off.
    pub fn discovery(mut self, enabled: bool) -> Self {
        self.discovery = Some(enabled);
        self
    }

    pub fn build(self) -> ConfigHandle {
        let overrides = self.overrides.unwrap_or_else(Overrides::from_process);
        let log_errors = self.log_errors.or(overrides.error_print).unwrap_or(true);
        let file_name = self
            .file_name
            .or(overrides.file)
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let handle = ConfigHandle::new(
            file_name,
            self.overlay,
            self.inline.unwrap_or_default(),
            self.watch_mode.backend(),
            log_errors,
            self.violence_check,
        );

        let mut rooted = false;
        if let Some(root) = overrides.path {
            match handle.set_path(&root) {
                Ok(()) => rooted = true,
                Err(e) => tracing::error!(
                    path = %root,
                    error = %e,
                    "custom configuration root does not exist, using default discovery"
                ),
            }
        }

        for path in &self.search_paths {
            if let Err(e) = handle.add_path(path) {
                tracing::debug!(path = %path, error = %e, "search path skipped");
            }
        }

        let discover = self
            .discovery
            .unwrap_or(!rooted && self.search_paths.is_empty());
        if discover {
            for dir in default_search_dirs() {
                handle.add_path_quietly(&dir.to_string_lossy());
            }
        }

        tracing::debug!(
            file = %handle.file_name(),
            search_paths = ?handle.search_paths(),
            "configuration handle ready"
        );
        handle
    }
}

fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(dir);
    }
    if let Ok(dir) = std::env::current_dir() {
        dirs.push(dir);
    }
    dirs
}
