//! Configuration content registered in memory under a file name.
//!
//! Inline content takes precedence over every search path and the overlay.
//! One store can be shared by several handles (the registry does this), so
//! content set once is visible to all of them.

use std::sync::Arc;

use dashmap::DashMap;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default)]
pub struct InlineContent {
    entries: DashMap<String, Arc<str>>,
}

impl InlineContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `content` for `name`; an empty name means the default file.
    pub fn set(&self, name: &str, content: impl Into<Arc<str>>) {
        self.entries.insert(key(name).to_string(), content.into());
    }

    pub fn get(&self, name: &str) -> Option<Arc<str>> {
        self.entries.get(key(name)).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns whether there was content to remove.
    pub fn remove(&self, name: &str) -> bool {
        self.entries.remove(key(name)).is_some()
    }

    /// Drop everything, returning the names that had content.
    pub fn clear(&self) -> Vec<String> {
        let names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        self.entries.clear();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(key(name))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key(name: &str) -> &str {
    if name.is_empty() {
        DEFAULT_CONFIG_FILE
    } else {
        name
    }
}
