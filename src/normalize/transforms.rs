//! Key sanitization and dynamic-map flattening

use super::visitor::Visitor;
use crate::types::JsonValue;
use serde_json::json;
use std::collections::BTreeSet;

// ============================================================================
// Key Sanitizer
// ============================================================================

/// Renames keys ending in the marker suffix
///
/// `archived?` becomes `is_archived` when `archived` is in the boolean
/// vocabulary, `flag?` becomes `flag` otherwise. Repeated suffixes are all
/// stripped, so a second pass never changes a sanitized key.
#[derive(Debug, Clone)]
pub struct KeySanitizer {
    suffix: String,
    vocabulary: BTreeSet<String>,
}

impl KeySanitizer {
    /// Create a sanitizer
    pub fn new(suffix: impl Into<String>, vocabulary: BTreeSet<String>) -> Self {
        Self {
            suffix: suffix.into(),
            vocabulary,
        }
    }

    /// Sanitize one key
    pub fn sanitize(&self, key: &str) -> Option<String> {
        if self.suffix.is_empty() || !key.ends_with(&self.suffix) {
            return None;
        }

        let mut base = key;
        while let Some(stripped) = base.strip_suffix(self.suffix.as_str()) {
            base = stripped;
        }

        if self.vocabulary.contains(base) {
            Some(format!("is_{base}"))
        } else {
            Some(base.to_string())
        }
    }
}

impl Visitor for KeySanitizer {
    fn visit_key(&self, key: String) -> String {
        self.sanitize(&key).unwrap_or(key)
    }
}

// ============================================================================
// Map Flattener
// ============================================================================

/// Converts object values of the configured fields into key/value arrays
///
/// `{"roles_users": {"u1": "admin"}}` becomes
/// `{"roles_users": [{"key": "u1", "value": "admin"}]}`. Values of any other
/// type are left alone.
#[derive(Debug, Clone)]
pub struct MapFlattener {
    fields: BTreeSet<String>,
}

impl MapFlattener {
    /// Create a flattener for the given field names
    pub fn new(fields: BTreeSet<String>) -> Self {
        Self { fields }
    }
}

impl Visitor for MapFlattener {
    fn visit_value(&self, key: &str, value: JsonValue) -> JsonValue {
        match value {
            JsonValue::Object(map) if self.fields.contains(key) => JsonValue::Array(
                map.into_iter()
                    .map(|(k, v)| json!({"key": k, "value": v}))
                    .collect(),
            ),
            other => other,
        }
    }
}
