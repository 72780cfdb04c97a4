//! Depth-first record traversal

use crate::types::JsonValue;

/// A structural rewrite applied to every object entry of a record tree
pub trait Visitor: Send + Sync {
    /// New name for an object key
    fn visit_key(&self, key: String) -> String {
        key
    }

    /// Replacement for the value stored under `key`
    ///
    /// Called after the value's own children have been visited.
    fn visit_value(&self, _key: &str, value: JsonValue) -> JsonValue {
        value
    }
}

/// Apply a visitor to every object entry, children first
///
/// Arrays are traversed element by element; scalars pass through unchanged.
/// When two keys of one object are renamed to the same name, the entry
/// visited last wins.
pub fn walk<V: Visitor + ?Sized>(value: JsonValue, visitor: &V) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(key, child)| {
                    let child = walk(child, visitor);
                    let key = visitor.visit_key(key);
                    let child = visitor.visit_value(&key, child);
                    (key, child)
                })
                .collect(),
        ),
        JsonValue::Array(items) => {
            JsonValue::Array(items.into_iter().map(|item| walk(item, visitor)).collect())
        }
        scalar => scalar,
    }
}
