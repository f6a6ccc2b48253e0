//! Dotted key-path lookup.
//!
//! `a.b.0.c` walks object keys and array indices. Keys may themselves
//! contain dots (`"http.addr" = ":8080"` in TOML), so at every object level
//! the whole remaining path is tried as a literal key before splitting.
//! Violence-check mode goes further and tries every grouping of the
//! remaining segments, longest key first, backtracking on dead ends.

use serde_json::Value;

pub(crate) const SEPARATOR: char = '.';

pub(crate) fn lookup<'a>(root: &'a Value, path: &str, violence_check: bool) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() || path == "." {
        return Some(root);
    }
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if violence_check {
        walk_exhaustive(root, &segments)
    } else {
        walk(root, &segments)
    }
}

fn walk<'a>(node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(node);
    };
    match node {
        Value::Object(map) => {
            if !rest.is_empty() {
                if let Some(value) = map.get(&segments.join(".")) {
                    return Some(value);
                }
            }
            walk(map.get(*first)?, rest)
        }
        Value::Array(items) => walk(items.get(index(first)?)?, rest),
        _ => None,
    }
}

fn walk_exhaustive<'a>(node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    if segments.is_empty() {
        return Some(node);
    }
    match node {
        Value::Object(map) => (1..=segments.len()).rev().find_map(|take| {
            let key = segments[..take].join(".");
            map.get(&key)
                .and_then(|child| walk_exhaustive(child, &segments[take..]))
        }),
        Value::Array(items) => walk_exhaustive(items.get(index(segments[0])?)?, &segments[1..]),
        _ => None,
    }
}

fn index(segment: &str) -> Option<usize> {
    segment.parse().ok()
}
