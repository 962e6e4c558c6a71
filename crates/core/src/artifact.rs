//! Artifact resolution over opaque agent results.
//!
//! Agents report a generated file by storing its path under one of
//! [`ARTIFACT_KEYS`] somewhere inside their result. The resolver walks the
//! result in pre-order and returns the first match, checking the keys of a
//! mapping in priority order before descending into its children.

use serde_json::Value;

/// Well-known artifact keys, highest priority first.
pub const ARTIFACT_KEYS: [&str; 3] = ["pdf", "output_file", "image_path"];

/// Locate the artifact path inside an agent result.
///
/// Only non-empty strings qualify. Returns `None` when no key is found or the
/// root is a scalar.
pub fn find_artifact(result: &Value) -> Option<&str> {
    // Explicit stack: depth is bounded by heap, not by the call stack.
    let mut stack: Vec<&Value> = vec![result];

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                for key in ARTIFACT_KEYS {
                    if let Some(Value::String(path)) = map.get(key) {
                        if !path.trim().is_empty() {
                            return Some(path.as_str());
                        }
                    }
                }
                // Reversed so the first child is popped first.
                stack.extend(map.values().rev().filter(|v| is_container(v)));
            }
            Value::Array(items) => {
                stack.extend(items.iter().rev().filter(|v| is_container(v)));
            }
            _ => {}
        }
    }

    None
}

/// Final path segment of an artifact path.
///
/// Both `/` and `\` are treated as separators. Empty, `.` and `..` segments
/// yield `None`.
pub fn artifact_file_name(path: &str) -> Option<&str> {
    let name = path
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}
