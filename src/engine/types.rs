//! Engine types
//!
//! Per-endpoint results and the run summary built from them.

use crate::error::Error;
use serde::Serialize;
use std::fmt;

/// Outcome of one endpoint's pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    /// Every page was fetched and the output published
    Succeeded,
    /// The pass was aborted; the watermark was left unchanged
    Failed,
    /// The run was cancelled before or during the pass
    Cancelled,
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Counters collected while an endpoint runs
#[derive(Debug, Clone, Default)]
pub struct EndpointStats {
    /// Records written to the partition
    pub records: usize,
    /// Records dropped by the archival filter
    pub archived: usize,
    /// Pages fetched
    pub pages: u32,
}

impl EndpointStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a fetched page
    pub fn add_page(&mut self) {
        self.pages += 1;
    }

    /// Count a written record
    pub fn add_record(&mut self) {
        self.records += 1;
    }

    /// Count a record dropped as archived
    pub fn add_archived(&mut self) {
        self.archived += 1;
    }
}

/// Result of one endpoint's extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Endpoint identifier
    pub endpoint: String,
    /// Watermark key of the endpoint
    pub state_key: String,
    /// Outcome
    pub status: EndpointStatus,
    /// Records written
    pub records: usize,
    /// Records dropped as archived
    pub archived: usize,
    /// Pages fetched
    pub pages: u32,
    /// Highest cursor observed, when the pass succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cursor: Option<String>,
    /// Data part written, when any records were published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent on the endpoint
    pub duration_ms: u64,
}

impl ExtractionResult {
    /// A successful pass
    pub fn succeeded(
        endpoint: impl Into<String>,
        state_key: impl Into<String>,
        stats: &EndpointStats,
        max_cursor: String,
        partition: Option<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            state_key: state_key.into(),
            status: EndpointStatus::Succeeded,
            records: stats.records,
            archived: stats.archived,
            pages: stats.pages,
            max_cursor: Some(max_cursor),
            partition,
            error: None,
            duration_ms: 0,
        }
    }

    /// An aborted pass
    ///
    /// Nothing was published, so the record count is zero whatever was
    /// fetched before the failure.
    pub fn failed(
        endpoint: impl Into<String>,
        state_key: impl Into<String>,
        stats: &EndpointStats,
        error: &Error,
    ) -> Self {
        let status = if matches!(error.root(), Error::Cancelled) {
            EndpointStatus::Cancelled
        } else {
            EndpointStatus::Failed
        };
        Self {
            endpoint: endpoint.into(),
            state_key: state_key.into(),
            status,
            records: 0,
            archived: stats.archived,
            pages: stats.pages,
            max_cursor: None,
            partition: None,
            error: Some(error.to_string()),
            duration_ms: 0,
        }
    }

    /// Set duration
    #[must_use]
    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    /// Whether the pass succeeded
    pub fn is_success(&self) -> bool {
        self.status == EndpointStatus::Succeeded
    }
}

/// Aggregated outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: String,
    /// One result per configured endpoint, in execution order
    pub results: Vec<ExtractionResult>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            results: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Add an endpoint result
    pub fn add_result(&mut self, result: ExtractionResult) {
        self.results.push(result);
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// Records written across all endpoints
    pub fn total_records(&self) -> usize {
        self.results.iter().map(|r| r.records).sum()
    }

    /// Endpoints whose pass succeeded
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Endpoints configured for the run
    pub fn configured(&self) -> usize {
        self.results.len()
    }

    /// Results that did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &ExtractionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Result for an endpoint
    pub fn result(&self, endpoint: &str) -> Option<&ExtractionResult> {
        self.results.iter().find(|r| r.endpoint == endpoint)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Total records: {}", self.total_records())?;
        writeln!(
            f,
            "  Successful endpoints: {}/{}",
            self.succeeded(),
            self.configured()
        )?;
        write!(f, "  Run ID: {}", self.run_id)?;
        for failure in self.failures() {
            match &failure.error {
                Some(error) => write!(f, "\n  {}: {error}", failure.status)?,
                None => write!(f, "\n  {} {}", failure.endpoint, failure.status)?,
            }
        }
        Ok(())
    }
}
