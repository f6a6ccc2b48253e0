//! Parsed configuration documents.
//!
//! # Data Flow
//! ```text
//! raw bytes (disk / overlay / inline)
//!     → format.rs (extension dispatch or content sniffing)
//!     → ini.rs / xml.rs / toml / serde_yaml / serde_json
//!     → serde_json::Value tree
//!     → Document (immutable, shared via Arc)
//!     → query.rs (dotted key paths)
//! ```
//!
//! # Design Decisions
//! - One value model for every format, so accessors are format-agnostic
//! - Documents are never mutated; a reload builds a new one
//! - Generic accessors return zero values for absent keys, only
//!   `get_struct` reports errors

mod format;
mod ini;
mod query;
mod xml;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

pub use format::{sniff, Format, FormatError};

/// Where a document's content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A real file; these are watched for changes.
    File(PathBuf),
    /// An entry of the resource overlay.
    Overlay(String),
    /// Content registered inline under a file name.
    Inline,
    /// Built directly from a value.
    Memory,
}

/// An immutable, queryable configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
    format: Option<Format>,
    origin: Origin,
    violence_check: bool,
}

impl Document {
    /// Parse content; `None` selects the format by sniffing the content.
    pub fn parse(content: &str, format: Option<Format>) -> std::result::Result<Self, FormatError> {
        let (format, root) = match format {
            Some(format) => (format, format.parse(content)?),
            None => sniff(content)?,
        };
        Ok(Self {
            root,
            format: Some(format),
            origin: Origin::Memory,
            violence_check: false,
        })
    }

    /// Wrap an already-built value.
    pub fn from_value(root: Value) -> Self {
        Self {
            root,
            format: None,
            origin: Origin::Memory,
            violence_check: false,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_violence_check(mut self, check: bool) -> Self {
        self.violence_check = check;
        self
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Format the content was parsed as, `None` for [`Document::from_value`].
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn violence_check(&self) -> bool {
        self.violence_check
    }

    /// Value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        query::lookup(&self.root, path, self.violence_check)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// String form of the value; `""` when absent or null.
    ///
    /// Numbers and booleans are stringified, arrays and objects are rendered
    /// as compact JSON.
    pub fn get_string(&self, path: &str) -> String {
        self.get(path).map(stringify).unwrap_or_default()
    }

    /// Every element stringified; a scalar yields a single element.
    pub fn get_strings(&self, path: &str) -> Vec<String> {
        match self.get(path) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(stringify).collect(),
            Some(value) => vec![stringify(value)],
        }
    }

    pub fn get_array(&self, path: &str) -> Vec<Value> {
        match self.get(path) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(value) => vec![value.clone()],
        }
    }

    pub fn get_map(&self, path: &str) -> Map<String, Value> {
        match self.get(path) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    pub fn get_int(&self, path: &str) -> i64 {
        match self.get(path) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or_default()
            }
            Some(Value::Bool(b)) => i64::from(*b),
            _ => 0,
        }
    }

    pub fn get_uint(&self, path: &str) -> u64 {
        match self.get(path) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or_default(),
            Some(Value::Bool(b)) => u64::from(*b),
            _ => 0,
        }
    }

    pub fn get_float(&self, path: &str) -> f64 {
        match self.get(path) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or_default(),
            Some(Value::Bool(b)) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    /// `false` for absent, null, zero, empty containers, and the strings
    /// `""`, `"0"`, `"false"`, `"off"`, `"no"` (any case).
    pub fn get_bool(&self, path: &str) -> bool {
        match self.get(path) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false" | "off" | "no"
            ),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
        }
    }

    /// Deserialize the value at `path` into `T`.
    pub fn get_struct<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get(path).ok_or_else(|| ConfigError::KeyNotFound {
            key: path.to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|source| ConfigError::Decode {
            key: path.to_string(),
            source,
        })
    }

    /// Pretty JSON rendering of the whole tree.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(&self.root).unwrap_or_default()
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
