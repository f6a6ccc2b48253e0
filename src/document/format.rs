//! Format detection and per-format parsing.
//!
//! Every supported format is converted into a `serde_json::Value` tree so
//! queries behave the same regardless of where the document came from.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::{ini, xml};

/// A configuration format selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Toml,
    Yaml,
    Json,
    Ini,
    Xml,
}

/// Parser-level failure.
#[derive(Debug, Error)]
#[error("{} content rejected: {message}", describe(.format))]
pub struct FormatError {
    /// Format that was attempted, `None` when content sniffing found no match.
    pub format: Option<Format>,
    pub message: String,
}

fn describe(format: &Option<Format>) -> String {
    match format {
        Some(format) => format.to_string(),
        None => "unrecognized".to_string(),
    }
}

impl FormatError {
    fn new(format: Format, message: impl fmt::Display) -> Self {
        Self {
            format: Some(format),
            message: message.to_string(),
        }
    }
}

impl Format {
    /// Probe order used when a registry instance looks for `name.<ext>`.
    pub const ALL: [Format; 5] = [
        Format::Toml,
        Format::Yaml,
        Format::Json,
        Format::Ini,
        Format::Xml,
    ];

    /// Canonical extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Toml => "toml",
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Ini => "ini",
            Format::Xml => "xml",
        }
    }

    /// Extensions probed for this format, canonical first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Yaml => &["yaml", "yml"],
            Format::Toml => &["toml"],
            Format::Json => &["json"],
            Format::Ini => &["ini"],
            Format::Xml => &["xml"],
        }
    }

    /// Map an extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "ini" => Some(Format::Ini),
            "xml" => Some(Format::Xml),
            _ => None,
        }
    }

    /// Format implied by a file name, if its extension is supported.
    pub fn from_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse `content` as this format.
    pub fn parse(self, content: &str) -> Result<Value, FormatError> {
        match self {
            Format::Toml => toml::from_str::<toml::Table>(content)
                .map(|table| toml_to_json(toml::Value::Table(table)))
                .map_err(|e| FormatError::new(self, e.to_string().trim_end())),
            Format::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
                .map(yaml_to_json)
                .map_err(|e| FormatError::new(self, e)),
            Format::Json => serde_json::from_str(content).map_err(|e| FormatError::new(self, e)),
            Format::Ini => ini::parse(content).map_err(|e| FormatError::new(self, e)),
            Format::Xml => xml::parse(content).map_err(|e| FormatError::new(self, e)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Toml => "TOML",
            Format::Yaml => "YAML",
            Format::Json => "JSON",
            Format::Ini => "INI",
            Format::Xml => "XML",
        };
        f.write_str(name)
    }
}

/// Guess the format of untyped content and parse it.
///
/// Order: JSON (when it opens with a bracket), XML (when it opens with `<`),
/// TOML, INI, then YAML restricted to mappings and sequences since almost any
/// text is a valid YAML scalar.
pub fn sniff(content: &str) -> Result<(Format, Value), FormatError> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = Format::Json.parse(trimmed) {
            return Ok((Format::Json, value));
        }
    }
    if trimmed.starts_with('<') {
        return Format::Xml.parse(trimmed).map(|value| (Format::Xml, value));
    }
    if let Ok(value) = Format::Toml.parse(content) {
        return Ok((Format::Toml, value));
    }
    if let Ok(value) = ini::parse(content) {
        if value.as_object().is_some_and(|map| !map.is_empty()) {
            return Ok((Format::Ini, value));
        }
    }
    if let Ok(value) = Format::Yaml.parse(content) {
        if value.is_object() || value.is_array() {
            return Ok((Format::Yaml, value));
        }
    }

    Err(FormatError {
        format: None,
        message: "content matches none of TOML, YAML, JSON, INI, XML".to_string(),
    })
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => match yaml_to_json(other) {
            Value::String(s) => s,
            value => value.to_string(),
        },
    }
}
