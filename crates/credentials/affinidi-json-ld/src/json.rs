//! Small helpers over `serde_json` values used across the algorithms.

use serde_json::{Map, Value};

use crate::keywords as kw;

/// Views a value as a list: arrays as their elements, anything else as a one-element slice.
pub fn as_slice(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Takes a value as an owned list.
pub fn into_vec(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Adds `value` under `key`, flattening arrays into the existing entry.
///
/// With `as_array` the entry is always an array, otherwise a single value
/// stays scalar until a second one arrives.
pub fn add_value(map: &mut Map<String, Value>, key: &str, value: Value, as_array: bool) {
    if let Value::Array(items) = value {
        if items.is_empty() && as_array {
            map.entry(key).or_insert_with(|| Value::Array(Vec::new()));
        }
        for item in items {
            add_value(map, key, item, as_array);
        }
        return;
    }

    match map.get_mut(key) {
        Some(Value::Array(existing)) => existing.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
        None if as_array => {
            map.insert(key.to_string(), Value::Array(vec![value]));
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

/// Appends `value` to the array under `key` unless an equal value is already there.
pub fn merge_value(map: &mut Map<String, Value>, key: &str, value: Value) {
    let entry = map
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        let previous = entry.take();
        *entry = Value::Array(vec![previous]);
    }
    if let Value::Array(items) = entry {
        let is_list = value.get(kw::LIST).is_some();
        if is_list || !items.iter().any(|item| deep_compare(item, &value)) {
            items.push(value);
        }
    }
}

/// Keys of a map, sorted when `ordered` is set.
pub fn keys(map: &Map<String, Value>, ordered: bool) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    if ordered {
        keys.sort();
    }
    keys
}

pub fn is_value_object(value: &Value) -> bool {
    value.get(kw::VALUE).is_some()
}

pub fn is_list_object(value: &Value) -> bool {
    value.get(kw::LIST).is_some()
}

/// A map with `@graph` and no entries besides `@id`, `@index` and `@context`.
pub fn is_graph_object(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => {
            map.contains_key(kw::GRAPH)
                && map
                    .keys()
                    .all(|k| matches!(k.as_str(), kw::GRAPH | kw::ID | kw::INDEX | kw::CONTEXT))
        }
        None => false,
    }
}

/// A graph object without `@id`.
pub fn is_simple_graph_object(value: &Value) -> bool {
    is_graph_object(value) && value.get(kw::ID).is_none()
}

/// A map that is not a value, list or set object.
pub fn is_node_object(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => {
            !map.contains_key(kw::VALUE)
                && !map.contains_key(kw::LIST)
                && !map.contains_key(kw::SET)
        }
        None => false,
    }
}

/// A map whose only entry is `@id`.
pub fn is_node_reference(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.len() == 1 && map.contains_key(kw::ID))
}

pub fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// Scalars are strings, numbers and booleans.
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// String value of `@id`, if any.
pub fn id_of(value: &Value) -> Option<&str> {
    value.get(kw::ID).and_then(Value::as_str)
}

/// Compares two expanded values, ignoring array order except inside `@list`.
pub fn deep_compare(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().all(|x| ys.iter().any(|y| deep_compare(x, y)))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, xv)| match y.get(k) {
                    Some(yv) if k == kw::LIST => ordered_compare(xv, yv),
                    Some(yv) => deep_compare(xv, yv),
                    None => false,
                })
        }
        _ => a == b,
    }
}

fn ordered_compare(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_compare(x, y))
        }
        _ => deep_compare(a, b),
    }
}
