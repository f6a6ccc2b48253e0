//! Minimal INI reader.
//!
//! `[section]` headers open an object; `key = value` lines before the first
//! header land at the top level. `;` and `#` start comment lines. Values keep
//! their text form, with one layer of matching quotes removed.

use serde_json::{Map, Value};

pub(crate) fn parse(content: &str) -> Result<Value, String> {
    let mut root = Map::new();
    let mut section: Option<String> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| format!("line {}: malformed section header", index + 1))?;
            root.entry(name.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            section = Some(name.to_string());
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| format!("line {}: expected `key = value`", index + 1))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("line {}: empty key", index + 1));
        }
        let value = Value::String(unquote(value.trim()).to_string());

        let target = match &section {
            Some(name) => match root.get_mut(name) {
                Some(Value::Object(map)) => map,
                _ => return Err(format!("line {}: section `{}` is not a table", index + 1, name)),
            },
            None => &mut root,
        };
        target.insert(key.to_string(), value);
    }

    Ok(Value::Object(root))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
