//! Page envelope types
//!
//! Defines the tagged shape of a decoded page.

use crate::types::{JsonObject, JsonValue};

/// The shape a page response was found in
#[derive(Debug, Clone, PartialEq)]
pub enum PageEnvelope {
    /// The response body is the record array
    Array(Vec<JsonValue>),
    /// The records sit under a field of the response object
    Wrapped {
        /// Field the records were read from
        field: String,
        /// The records
        records: Vec<JsonValue>,
    },
    /// Neither shape matched
    Empty,
}

impl PageEnvelope {
    /// Resolve the shape of a response
    ///
    /// `records_fields` are tried in order; the first one holding a non-empty
    /// array wins, falling back to the first array when every one is empty.
    /// A field holding anything other than an array is skipped.
    pub fn from_value(value: JsonValue, records_fields: &[String]) -> Self {
        match value {
            JsonValue::Array(records) => Self::Array(records),
            JsonValue::Object(mut map) => {
                let field = records_field(&map, records_fields);
                match field.and_then(|f| map.remove(f.as_str()).map(|v| (f, v))) {
                    Some((field, JsonValue::Array(records))) => Self::Wrapped {
                        field: field.clone(),
                        records,
                    },
                    _ => Self::Empty,
                }
            }
            _ => Self::Empty,
        }
    }

    /// Number of records a response carries, without taking them out
    pub fn count(value: &JsonValue, records_fields: &[String]) -> usize {
        match value {
            JsonValue::Array(records) => records.len(),
            JsonValue::Object(map) => records_field(map, records_fields)
                .and_then(|f| map.get(f.as_str()))
                .and_then(JsonValue::as_array)
                .map_or(0, Vec::len),
            _ => 0,
        }
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        match self {
            Self::Array(records) | Self::Wrapped { records, .. } => records.len(),
            Self::Empty => 0,
        }
    }

    /// Whether the page carries no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field the records were read from, if wrapped
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Wrapped { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Take the records out of the envelope
    pub fn into_records(self) -> Vec<JsonValue> {
        match self {
            Self::Array(records) | Self::Wrapped { records, .. } => records,
            Self::Empty => Vec::new(),
        }
    }
}

/// First candidate field holding records, else the first holding an array
fn records_field<'a>(map: &JsonObject, records_fields: &'a [String]) -> Option<&'a String> {
    let mut arrays = records_fields
        .iter()
        .filter_map(|f| map.get(f.as_str()).and_then(JsonValue::as_array).map(|a| (f, a)));
    let first = arrays.next()?;
    let chosen = std::iter::once(first)
        .chain(arrays)
        .find(|(_, records)| !records.is_empty())
        .unwrap_or(first);
    Some(chosen.0)
}
