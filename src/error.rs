//! Error types for path management and document lookup.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::FormatError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything that can go wrong while managing search paths or fetching a document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `add_path`/`set_path` could not find the directory anywhere.
    #[error("cannot find directory \"{path}\"{}", list_searched(.searched))]
    PathNotFound { path: String, searched: Vec<String> },

    /// `add_path`/`set_path` found an entry, but it is a file.
    #[error("path \"{path}\" should be a directory")]
    NotADirectory { path: String },

    /// The file name resolves to nothing and has no inline content.
    #[error("cannot find config file \"{name}\"{}", list_candidates(.searched))]
    FileNotAvailable { name: String, searched: Vec<String> },

    /// Content was found but the parser rejected it.
    #[error("failed to load \"{source_name}\": {error}")]
    Parse {
        source_name: String,
        #[source]
        error: FormatError,
    },

    /// The resolved file could not be read.
    #[error("failed to read \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Watch registration failed; the document is served without auto-invalidation.
    #[error("failed to watch \"{}\": {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// `get_struct` on a key that does not exist.
    #[error("key \"{key}\" not found")]
    KeyNotFound { key: String },

    /// `get_struct` on a value of the wrong shape.
    #[error("cannot decode key \"{key}\": {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Whether this is the ordinary "not present, try the next candidate" signal.
    pub fn is_not_available(&self) -> bool {
        matches!(self, ConfigError::FileNotAvailable { .. })
    }
}

fn list_searched(searched: &[String]) -> String {
    if searched.is_empty() {
        return ": path does not exist".to_string();
    }
    let mut out = String::from(" in following paths:");
    for (i, path) in searched.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, path));
    }
    out
}

fn list_candidates(searched: &[String]) -> String {
    if searched.is_empty() {
        return " with no path set/add".to_string();
    }
    let mut out = String::from(" in following paths:");
    let mut index = 1;
    for path in searched {
        let path = path.trim_end_matches(['/', '\\']);
        out.push_str(&format!("\n{}. {}", index, path));
        out.push_str(&format!("\n{}. {}{}config", index + 1, path, std::path::MAIN_SEPARATOR));
        index += 2;
    }
    out
}
