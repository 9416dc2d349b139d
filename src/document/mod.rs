//! Typed accessors over the asset's JSON tree
//!
//! The document is a schema-free `serde_json::Value`: entities reference each
//! other strictly by integer array position, so all mutation goes through
//! these typed, default-valued helpers instead of a concrete schema type.
//! Object key order is preserved across a parse/serialize round trip.

use serde_json::Value;

/// Default-valued accessors and in-place mutation on JSON object nodes.
///
/// Getters return the provided default (or `None`) when the key is absent or
/// holds a value of the wrong kind; setters are no-ops on non-object nodes.
pub trait ValueExt {
    /// Borrow the array under `key`.
    fn get_array(&self, key: &str) -> Option<&Vec<Value>>;

    /// Mutably borrow the array under `key`.
    fn get_array_mut(&mut self, key: &str) -> Option<&mut Vec<Value>>;

    /// Integer value under `key`, or `default` when absent or non-numeric.
    fn get_int_or(&self, key: &str, default: i64) -> i64;

    /// String value under `key`.
    fn get_str(&self, key: &str) -> Option<&str>;

    /// Set an integer, removing the key entirely when `value == default`.
    fn set_int(&mut self, key: &str, value: i64, default: i64);

    /// Insert or replace `key` with `value`.
    fn insert(&mut self, key: &str, value: Value);

    /// Remove `key` if present.
    fn remove_key(&mut self, key: &str);
}

impl ValueExt for Value {
    fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    fn get_array_mut(&mut self, key: &str) -> Option<&mut Vec<Value>> {
        self.get_mut(key).and_then(Value::as_array_mut)
    }

    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn set_int(&mut self, key: &str, value: i64, default: i64) {
        if let Some(map) = self.as_object_mut() {
            if value == default {
                map.remove(key);
            } else {
                map.insert(key.to_string(), Value::from(value));
            }
        }
    }

    fn insert(&mut self, key: &str, value: Value) {
        if let Some(map) = self.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }

    fn remove_key(&mut self, key: &str) {
        if let Some(map) = self.as_object_mut() {
            map.remove(key);
        }
    }
}

/// Borrow the array at a nested `path` of object keys.
pub fn array_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    let (last, parents) = path.split_last()?;
    let mut node = root;
    for key in parents {
        node = node.get(key)?;
    }
    node.get_array(last)
}

/// Mutably borrow the array at a nested `path` of object keys.
pub fn array_at_mut<'a>(root: &'a mut Value, path: &[&str]) -> Option<&'a mut Vec<Value>> {
    let (last, parents) = path.split_last()?;
    let mut node = root;
    for key in parents {
        node = node.get_mut(key)?;
    }
    node.get_array_mut(last)
}

/// Borrow the array under `key` on the root object, creating an empty one
/// when the key is absent.
pub fn ensure_array<'a>(root: &'a mut Value, key: &str) -> Option<&'a mut Vec<Value>> {
    let map = root.as_object_mut()?;
    map.entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
}
