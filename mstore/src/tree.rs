//! Helpers for reading and writing nested JSON documents by path.
//!
//! Writing `null` or an empty object at a path removes the node and prunes any
//! parents left empty. A `null` member inside a written object is kept as an
//! explicit empty marker. Arrays are leaf values.

use serde_json::{Map, Value};

use crate::DocumentPath;

/// Drops empty objects. Returns `None` when the value itself amounts to removal.
pub(crate) fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => prune_empty_objects(other),
    }
}

fn prune_empty_objects(value: Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let pruned = map
                .into_iter()
                .filter_map(|(key, child)| prune_empty_objects(child).map(|child| (key, child)))
                .collect::<Map<_, _>>();
            (!pruned.is_empty()).then_some(Value::Object(pruned))
        }
        other => Some(other),
    }
}

pub(crate) fn get_at(root: &Value, path: &DocumentPath) -> Option<Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node.clone())
}

/// Writes `value` at `path`, creating intermediate objects and replacing any
/// leaf that sits where an object is needed.
pub(crate) fn set_at(root: &mut Value, path: &DocumentPath, value: Value) {
    match normalize(value) {
        Some(value) => insert(root, path.segments(), value),
        None => {
            remove(root, path.segments());
        }
    }
}

fn insert(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }

    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        insert(child, rest, value);
    }
}

/// Returns true when `node` became empty and should be pruned by its parent.
fn remove(node: &mut Value, segments: &[String]) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        return true;
    };

    let Value::Object(map) = node else {
        return false;
    };

    let prune_child = match map.get_mut(head) {
        Some(child) => remove(child, rest),
        None => false,
    };
    if prune_child {
        map.remove(head);
    }

    map.is_empty()
}

/// Flattens a normalized value into `(path, leaf)` rows.
pub(crate) fn flatten(path: &DocumentPath, value: &Value, rows: &mut Vec<(String, Value)>) {
    flatten_raw(path.as_str(), value, rows);
}

fn flatten_raw(path: String, value: &Value, rows: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_raw(format!("{path}/{key}"), child, rows);
            }
        }
        leaf => rows.push((path, leaf.clone())),
    }
}

/// Rebuilds the subtree rooted at `path` from flattened leaf rows.
pub(crate) fn unflatten(path: &DocumentPath, rows: Vec<(String, Value)>) -> Option<Value> {
    let base = path.as_str();
    let mut root = Value::Null;

    for (row_path, leaf) in rows {
        if row_path == base {
            return Some(leaf);
        }

        let Some(relative) = row_path
            .strip_prefix(base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            continue;
        };
        let segments = relative.split('/').map(str::to_string).collect::<Vec<_>>();
        insert(&mut root, &segments, leaf);
    }

    normalize(root)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(raw: &str) -> DocumentPath {
        DocumentPath::parse(raw).expect("path should parse")
    }

    #[test]
    fn set_creates_parents_and_get_reads_back() {
        let mut root = Value::Null;
        set_at(&mut root, &path("users/u1/credits"), json!(50));

        assert_eq!(root, json!({"users": {"u1": {"credits": 50}}}));
        assert_eq!(get_at(&root, &path("users/u1")), Some(json!({"credits": 50})));
        assert_eq!(get_at(&root, &path("users/u2")), None);
        assert_eq!(get_at(&root, &path("users/u1/credits/deeper")), None);
    }

    #[test]
    fn null_write_removes_node_and_prunes_empty_parents() {
        let mut root = json!({"chats": {"u1": {"s1": {"title": "a"}}}, "users": {"u1": 1}});
        set_at(&mut root, &path("chats/u1/s1"), Value::Null);

        assert_eq!(root, json!({"users": {"u1": 1}}));
    }

    #[test]
    fn null_members_are_kept_and_empty_objects_dropped() {
        let mut root = Value::Null;
        set_at(
            &mut root,
            &path("doc"),
            json!({"a": null, "b": {}, "c": {"d": {}}, "e": [1, null]}),
        );

        assert_eq!(root, json!({"doc": {"a": null, "e": [1, null]}}));

        set_at(&mut root, &path("doc"), json!({}));
        assert_eq!(root, json!({}));
    }

    #[test]
    fn writing_below_a_leaf_replaces_it_with_an_object() {
        let mut root = json!({"a": 5});
        set_at(&mut root, &path("a/b"), json!(true));
        assert_eq!(root, json!({"a": {"b": true}}));
    }

    #[test]
    fn flatten_and_unflatten_restore_the_subtree() {
        let base = path("chats/u1");
        let value = json!({"s1": {"title": "Hi", "messages": [{"id": "m"}]}, "s2": {"mode": "Assistant"}});
        let mut rows = Vec::new();
        flatten(&base, &value, &mut rows);

        assert!(rows.contains(&("chats/u1/s1/title".to_string(), json!("Hi"))));
        assert_eq!(rows.len(), 3);
        assert_eq!(unflatten(&base, rows), Some(value));
    }
}
