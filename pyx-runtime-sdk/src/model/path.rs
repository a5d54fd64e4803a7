use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PyxError, PyxResult};

/// One lookup step into a call's argument structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Key(key) => write!(f, "{:?}", key),
        }
    }
}

pub fn format_path(path: &[PathSegment]) -> String {
    let steps: Vec<String> = path.iter().map(ToString::to_string).collect();
    format!("[{}]", steps.join(","))
}

/// Decodes a preload plan key. Keys are JSON texts: an array is a multi-step path,
/// a lone number or string is a single step.
pub fn parse_path_key(key: &str) -> PyxResult<Vec<PathSegment>> {
    let decoded: Value = serde_json::from_str(key).map_err(|e| PyxError::MalformedPlan {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    match decoded {
        Value::Array(steps) => steps
            .into_iter()
            .map(|step| segment_from_value(key, step))
            .collect(),
        single => Ok(vec![segment_from_value(key, single)?]),
    }
}

fn segment_from_value(key: &str, value: Value) -> PyxResult<PathSegment> {
    match value {
        Value::String(name) => Ok(PathSegment::Key(name)),
        Value::Number(number) => number
            .as_u64()
            .map(|index| PathSegment::Index(index as usize))
            .ok_or_else(|| PyxError::MalformedPlan {
                key: key.to_string(),
                reason: format!("{} is not a valid array index", number),
            }),
        other => Err(PyxError::MalformedPlan {
            key: key.to_string(),
            reason: format!("path steps must be strings or indices, got {}", other),
        }),
    }
}

/// Follows `path` from `root`. Integer steps against an object look up the
/// decimal key, the same way a property access on a script object would.
pub fn walk<'a>(root: &'a Value, path: &[PathSegment]) -> PyxResult<&'a Value> {
    path.iter()
        .enumerate()
        .try_fold(root, |current, (depth, segment)| {
            let next = match (current, segment) {
                (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
                (Value::Object(map), PathSegment::Key(key)) => map.get(key),
                (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
                _ => None,
            };

            next.ok_or_else(|| PyxError::InvalidPath {
                path: format_path(path),
                reason: format!(
                    "step {} ({}) does not resolve against {}",
                    depth,
                    segment,
                    kind_of(current)
                ),
            })
        })
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(items) => format!("an array of length {}", items.len()),
        Value::Object(_) => "an object".to_string(),
    }
}
