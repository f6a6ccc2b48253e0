//! Named configuration handles.
//!
//! # Responsibilities
//! - Map instance names to lazily built, shared [`ConfigHandle`]s
//! - Pick each instance's default file by probing `name.<ext>`
//! - Share one inline content store across all handles
//!
//! # Design Decisions
//! - An explicit object; [`Registry::global`] is a convenience, not a requirement
//! - Handles are built at most once per name, concurrent callers share the
//!   result; the map lock is only held to fetch a name's slot, so building one
//!   handle never blocks lookups of another
//! - `reset()` exists for tests and drops every handle

use std::sync::{Arc, LazyLock, OnceLock};

use dashmap::DashMap;

use crate::content::{InlineContent, DEFAULT_CONFIG_FILE};
use crate::document::Format;
use crate::handle::{ConfigHandle, ConfigHandleBuilder};

/// Name used when none is given.
pub const DEFAULT_INSTANCE: &str = "default";

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

type Slot = Arc<OnceLock<Arc<ConfigHandle>>>;

pub struct Registry {
    handles: DashMap<String, Slot>,
    template: ConfigHandleBuilder,
    inline: Arc<InlineContent>,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_template(ConfigHandleBuilder::new())
    }

    /// Every handle is built from a clone of `template`.
    pub fn with_template(template: ConfigHandleBuilder) -> Self {
        Self {
            handles: DashMap::new(),
            template,
            inline: Arc::new(InlineContent::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Handle for `name`, built on first use. Empty means [`DEFAULT_INSTANCE`].
    pub fn instance(&self, name: &str) -> Arc<ConfigHandle> {
        let name = if name.is_empty() { DEFAULT_INSTANCE } else { name };
        let slot = match self.handles.get(name) {
            Some(slot) => Arc::clone(slot.value()),
            None => Arc::clone(self.handles.entry(name.to_string()).or_default().value()),
        };
        Arc::clone(slot.get_or_init(|| Arc::new(self.build(name))))
    }

    fn build(&self, name: &str) -> ConfigHandle {
        let handle = self
            .template
            .clone()
            .inline_content(Arc::clone(&self.inline))
            .build();

        let probed = Format::ALL
            .iter()
            .flat_map(|format| format.extensions())
            .map(|ext| format!("{name}.{ext}"))
            .find(|file| handle.available(file));
        if let Some(file) = probed {
            tracing::debug!(instance = name, file = %file, "instance file selected");
            handle.set_file_name(file);
        }
        handle
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.handles.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drop every handle; the next `instance` call builds a fresh one.
    pub fn reset(&self) {
        self.handles.clear();
    }

    // ---- inline content shared by all handles ----

    /// Register inline content for every handle.
    ///
    /// Handles may have different default files, so an empty name means
    /// [`DEFAULT_CONFIG_FILE`] here, not a handle's default. Use
    /// [`ConfigHandle::set_content`] to target one handle's default file.
    pub fn set_content(&self, name: &str, content: impl Into<Arc<str>>) {
        self.inline.set(name, content);
        self.evict_everywhere(content_key(name));
    }

    /// Drop inline content; an empty name means [`DEFAULT_CONFIG_FILE`].
    pub fn remove_content(&self, name: &str) {
        if self.inline.remove(name) {
            self.evict_everywhere(content_key(name));
        }
    }

    pub fn clear_content(&self) {
        for name in self.inline.clear() {
            self.evict_everywhere(&name);
        }
    }

    pub fn content(&self) -> &Arc<InlineContent> {
        &self.inline
    }

    fn evict_everywhere(&self, name: &str) {
        for slot in self.handles.iter() {
            if let Some(handle) = slot.get() {
                handle.evict(name);
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn content_key(name: &str) -> &str {
    if name.is_empty() {
        DEFAULT_CONFIG_FILE
    } else {
        name
    }
}
