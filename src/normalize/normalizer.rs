//! The two-pass record normalizer

use super::transforms::{KeySanitizer, MapFlattener};
use super::visitor::walk;
use crate::config::NormalizeConfig;
use crate::types::JsonValue;

/// Normalizes records and filters archived ones
#[derive(Debug, Clone)]
pub struct Normalizer {
    sanitizer: KeySanitizer,
    flattener: MapFlattener,
    archived_keys: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

impl Normalizer {
    /// Create a normalizer from configuration
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            sanitizer: KeySanitizer::new(
                config.marker_suffix.clone(),
                config.boolean_vocabulary.clone(),
            ),
            flattener: MapFlattener::new(config.dynamic_map_fields.clone()),
            archived_keys: config.archived_keys.clone(),
        }
    }

    /// Whether the raw record carries a true archival flag
    ///
    /// Evaluated on the record as received, before any key is renamed.
    pub fn is_archived(&self, record: &JsonValue) -> bool {
        self.archived_keys
            .iter()
            .any(|key| record.get(key).and_then(JsonValue::as_bool) == Some(true))
    }

    /// Apply key sanitization, then dynamic-map flattening
    pub fn normalize(&self, record: JsonValue) -> JsonValue {
        let renamed = walk(record, &self.sanitizer);
        walk(renamed, &self.flattener)
    }

    /// Drop the record if archived, otherwise normalize it
    pub fn prepare(&self, record: JsonValue) -> Option<JsonValue> {
        if self.is_archived(&record) {
            return None;
        }
        Some(self.normalize(record))
    }
}
