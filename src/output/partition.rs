//! Partition layout
//!
//! Format: `raw/{source}/{state_key}/dt={YYYY-MM-DD}/hr={HH}/run={run_id}/`
//!
//! Examples:
//! - `raw/scope/companies_search/dt=2025-03-10/hr=08/run=20250310T081500Z/part-00000.json.gz`
//! - `raw/scope/companies_search/dt=2025-03-10/hr=08/run=20250310T081500Z/_SUCCESS`

use chrono::{DateTime, Utc};

/// Name of the single data part in a partition
pub const DATA_PART: &str = "part-00000.json.gz";

/// Name of the completion marker
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Address of one run's output for one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPath {
    dir: String,
}

impl PartitionPath {
    /// Build the partition for an endpoint, a run start time and a run id
    pub fn new(source: &str, state_key: &str, started_at: DateTime<Utc>, run_id: &str) -> Self {
        let date = started_at.format("%Y-%m-%d");
        let hour = started_at.format("%H");
        Self {
            dir: format!("raw/{source}/{state_key}/dt={date}/hr={hour}/run={run_id}"),
        }
    }

    /// Directory holding the partition
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Key of the data part
    pub fn data_key(&self) -> String {
        format!("{}/{DATA_PART}", self.dir)
    }

    /// Key of the completion marker
    pub fn marker_key(&self) -> String {
        format!("{}/{SUCCESS_MARKER}", self.dir)
    }
}
