// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Key order of a loaded workflow file
//!
//! Serialization writes every struct in field order. Replaying the parsed
//! file's key order over that output keeps an unchanged document
//! byte-for-byte stable and puts new keys next to their neighbours.

use serde_yaml::{Mapping, Value};

/// Mapping shapes of a parsed file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    shape: Option<Value>,
}

impl Layout {
    /// Remember the key order of `value`
    pub fn capture(value: Value) -> Self {
        Self { shape: Some(value) }
    }

    /// Reorder the mappings of a serialized document to follow the captured file
    ///
    /// The order of jobs is left alone: it belongs to the document.
    pub fn apply(&self, value: Value) -> Value {
        let shape = match &self.shape {
            Some(Value::Mapping(shape)) => shape,
            _ => return value,
        };
        let map = match value {
            Value::Mapping(map) => map,
            other => return other,
        };

        let mut top = order_keys(map, shape);
        for (key, child) in top.iter_mut() {
            let Some(child_shape) = shape.get(key) else {
                continue;
            };

            if key.as_str() == Some("jobs") {
                if let (Value::Mapping(jobs), Value::Mapping(job_shapes)) = (child, child_shape) {
                    for (id, job) in jobs.iter_mut() {
                        if let Some(job_shape) = job_shapes.get(id) {
                            let current = std::mem::replace(job, Value::Null);
                            *job = arrange(current, job_shape);
                        }
                    }
                }
            } else {
                let current = std::mem::replace(child, Value::Null);
                *child = arrange(current, child_shape);
            }
        }
        Value::Mapping(top)
    }
}

/// Recursively reorder `value` after `shape`; sequences pair up by index
fn arrange(value: Value, shape: &Value) -> Value {
    match (value, shape) {
        (Value::Mapping(map), Value::Mapping(shape)) => {
            let mut ordered = order_keys(map, shape);
            for (key, child) in ordered.iter_mut() {
                if let Some(child_shape) = shape.get(key) {
                    let current = std::mem::replace(child, Value::Null);
                    *child = arrange(current, child_shape);
                }
            }
            Value::Mapping(ordered)
        }
        (Value::Sequence(items), Value::Sequence(shapes)) => Value::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| match shapes.get(idx) {
                    Some(item_shape) => arrange(item, item_shape),
                    None => item,
                })
                .collect(),
        ),
        (value, _) => value,
    }
}

/// Keys known to `shape` come first in its order. A new key goes right after
/// the nearest key that preceded it in `map`, or first if there is none.
fn order_keys(mut map: Mapping, shape: &Mapping) -> Mapping {
    let written: Vec<Value> = map.keys().cloned().collect();
    let mut order: Vec<Value> = shape
        .keys()
        .filter(|key| map.contains_key(*key))
        .cloned()
        .collect();

    for (idx, key) in written.iter().enumerate() {
        if order.contains(key) {
            continue;
        }
        let at = written[..idx]
            .iter()
            .rev()
            .find_map(|prev| order.iter().position(|k| k == prev))
            .map_or(0, |pos| pos + 1);
        order.insert(at, key.clone());
    }

    let mut ordered = Mapping::new();
    for key in order {
        if let Some(value) = map.remove(&key) {
            ordered.insert(key, value);
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_known_keys_follow_the_file() {
        let layout = Layout::capture(yaml("name: CI\non: {}\nconcurrency: x\njobs: {}\n"));
        let out = layout.apply(yaml("name: CI\non: {}\njobs: {}\nconcurrency: x\n"));
        let keys: Vec<_> = out.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![yaml("name"), yaml("on"), yaml("concurrency"), yaml("jobs")]);
    }

    #[test]
    fn test_new_keys_land_after_their_predecessor() {
        let layout = Layout::capture(yaml("a: 1\nc: 3\n"));
        let out = layout.apply(yaml("a: 1\nb: 2\nc: 3\nd: 4\n"));
        assert_eq!(serde_yaml::to_string(&out).unwrap(), "a: 1\nb: 2\nc: 3\nd: 4\n");

        let layout = Layout::capture(yaml("c: 3\na: 1\n"));
        let out = layout.apply(yaml("z: 0\na: 1\nc: 3\n"));
        assert_eq!(serde_yaml::to_string(&out).unwrap(), "z: 0\nc: 3\na: 1\n");
    }

    #[test]
    fn test_job_order_comes_from_the_document() {
        let layout = Layout::capture(yaml(
            "jobs:\n  test:\n    runs-on: x\n    needs: build\n  build:\n    runs-on: x\n",
        ));
        let out = layout.apply(yaml(
            "jobs:\n  build:\n    runs-on: x\n  test:\n    needs: build\n    runs-on: x\n",
        ));
        assert_eq!(
            serde_yaml::to_string(&out).unwrap(),
            "jobs:\n  build:\n    runs-on: x\n  test:\n    runs-on: x\n    needs: build\n"
        );
    }
}
