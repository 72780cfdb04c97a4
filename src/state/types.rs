//! Watermark document
//!
//! Serialized to JSON and persisted between runs.

use serde::{Deserialize, Serialize};

/// Persisted watermark for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    /// Highest cursor value seen by the last successful pass
    ///
    /// Absent in hand-edited state documents; read as blank.
    #[serde(default)]
    pub updated_after: String,
}

impl Watermark {
    /// Create a watermark
    pub fn new(updated_after: impl Into<String>) -> Self {
        Self {
            updated_after: updated_after.into(),
        }
    }
}
