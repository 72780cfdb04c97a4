//! Execution engine module
//!
//! Drives one extraction run across every configured endpoint.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Orchestrator` - Resolves the endpoint order, then runs each endpoint's
//!   pass (read watermark, fetch pages, normalize, publish, write watermark)
//! - `ExtractionResult` - Outcome of one endpoint's pass
//! - `RunSummary` - Aggregated outcome of a run
//!
//! Dependency cycles and missing credentials abort the run before any
//! endpoint executes. Any other error aborts only the endpoint it occurred
//! in; the run moves on to the next endpoint in order.

mod types;

pub use types::{EndpointStats, EndpointStatus, ExtractionResult, RunSummary};

use crate::auth::CredentialProvider;
use crate::config::{EndpointSpec, ExtractConfig};
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpTransport, RetryPolicy};
use crate::normalize::Normalizer;
use crate::output::{BlobStore, NdjsonGzipWriter, PartitionPath, Publisher};
use crate::pagination::{paginator_for, PageFetcher};
use crate::resolve::{dependency_levels, resolve_order};
use crate::state::{BlobWatermarkStore, WatermarkStore};
use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Values fixed for the whole run
struct RunContext {
    run_id: String,
    started_at: DateTime<Utc>,
    default_watermark: String,
    token: String,
}

/// Runs an extraction across all configured endpoints
pub struct Orchestrator {
    config: ExtractConfig,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialProvider>,
    publisher: Publisher,
    watermarks: Arc<dyn WatermarkStore>,
    normalizer: Normalizer,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator
    ///
    /// Partitions and watermarks are both written to `store`.
    pub fn new(
        config: ExtractConfig,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialProvider>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        let watermarks = Arc::new(BlobWatermarkStore::new(store.clone(), config.source.clone()));
        let normalizer = Normalizer::new(&config.normalize);
        let policy = RetryPolicy::from(&config.http);
        Self {
            config,
            transport,
            credentials,
            publisher: Publisher::new(store),
            watermarks,
            normalizer,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a separate watermark store
    #[must_use]
    pub fn with_watermarks(mut self, watermarks: Arc<dyn WatermarkStore>) -> Self {
        self.watermarks = watermarks;
        self
    }

    /// Override the retry policy derived from the HTTP config
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stop the run when `cancel` fires
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the run configuration
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Endpoint dependency levels, without any I/O
    pub fn plan(&self) -> Result<Vec<Vec<String>>> {
        dependency_levels(&self.config.endpoints)
    }

    /// Run every endpoint, starting now
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now()).await
    }

    /// Run every endpoint for a run started at `started_at`
    ///
    /// Returns `Err` only for fatal errors. Endpoint failures are reported
    /// in the summary.
    pub async fn run_at(&self, started_at: DateTime<Utc>) -> Result<RunSummary> {
        let start = Instant::now();

        let order = resolve_order(&self.config.endpoints)?;
        info!(order = %order.join(" -> "), "Execution order");

        let default_watermark = self.config.default_watermark(started_at)?;
        let token = self.credentials.get_token().await?;
        let ctx = RunContext {
            run_id: self.config.resolved_run_id(started_at),
            started_at,
            default_watermark,
            token,
        };

        let mut summary = RunSummary::new(ctx.run_id.clone());
        if self.config.concurrency <= 1 {
            for name in &order {
                summary.add_result(self.extract_endpoint(&ctx, name).await);
            }
        } else {
            for level in dependency_levels(&self.config.endpoints)? {
                let results: Vec<ExtractionResult> = stream::iter(level.iter())
                    .map(|name| self.extract_endpoint(&ctx, name))
                    .buffered(self.config.concurrency)
                    .collect()
                    .await;
                for result in results {
                    summary.add_result(result);
                }
            }
        }

        summary.set_duration(elapsed_ms(start));
        info!(
            run_id = %summary.run_id,
            records = summary.total_records(),
            succeeded = summary.succeeded(),
            configured = summary.configured(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Run one endpoint's pass, converting any failure into a result
    async fn extract_endpoint(&self, ctx: &RunContext, name: &str) -> ExtractionResult {
        let start = Instant::now();
        let Some(spec) = self.config.endpoints.get(name) else {
            let error = Error::endpoint_failed(name, Error::config(format!("Unknown endpoint: {name}")));
            return ExtractionResult::failed(name, name, &EndpointStats::new(), &error);
        };
        let state_key = spec.state_key();
        let mut stats = EndpointStats::new();

        let result = if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            info!(endpoint = name, resource = %spec.resource, "Starting extraction");
            self.try_extract(ctx, name, spec, &mut stats).await
        };

        let result = match result {
            Ok((max_cursor, partition)) => {
                if partition.is_some() {
                    info!(endpoint = name, records = stats.records, "Endpoint complete");
                } else {
                    info!(endpoint = name, "No new records");
                }
                ExtractionResult::succeeded(name, &state_key, &stats, max_cursor, partition)
            }
            Err(error) => {
                let error = Error::endpoint_failed(name, error);
                warn!(endpoint = name, error = %error, "Endpoint failed");
                ExtractionResult::failed(name, &state_key, &stats, &error)
            }
        };
        result.with_duration(elapsed_ms(start))
    }

    /// Read watermark, fetch, normalize, publish, write watermark
    ///
    /// Returns the highest cursor seen and the published data part, if any.
    async fn try_extract(
        &self,
        ctx: &RunContext,
        name: &str,
        spec: &EndpointSpec,
        stats: &mut EndpointStats,
    ) -> Result<(String, Option<String>)> {
        let state_key = spec.state_key();
        let watermark = self
            .watermarks
            .read(&state_key, &ctx.default_watermark)
            .await?;

        let mut fetcher = PageFetcher::new(
            name,
            self.transport.clone(),
            self.page_request(spec, &ctx.token),
            paginator_for(&spec.pagination, spec.page_size),
            self.policy,
        )
        .with_records_fields(self.config.records_fields.clone())
        .with_max_pages(self.config.max_pages);

        let mut buffer = NdjsonGzipWriter::new();
        let mut max_cursor = watermark;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let Some(page) = fetcher.next_page().await? else {
                break;
            };
            stats.add_page();

            for record in page {
                let Some(record) = self.normalizer.prepare(record) else {
                    stats.add_archived();
                    continue;
                };
                if let Some(cursor) = cursor_of(&record, &self.config.cursor_fields) {
                    if cursor > max_cursor.as_str() {
                        max_cursor = cursor.to_string();
                    }
                }
                buffer.write_record(&record)?;
                stats.add_record();
            }
        }

        let partition = PartitionPath::new(
            &self.config.source,
            &state_key,
            ctx.started_at,
            &ctx.run_id,
        );
        let Some(published) = self.publisher.publish(&partition, buffer).await? else {
            return Ok((max_cursor, None));
        };

        self.watermarks.write(&state_key, &max_cursor).await?;
        Ok((max_cursor, Some(published.data_uri)))
    }

    /// Request template shared by every page of an endpoint
    fn page_request(&self, spec: &EndpointSpec, token: &str) -> HttpRequest {
        let mut request = HttpRequest::new(spec.pagination.method(), self.config.endpoint_url(spec))
            .header("Authorization", format!("Bearer {token}"))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .timeout(self.config.http.timeout());
        for (key, value) in &spec.query {
            request = request.query(key, value);
        }
        request
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("source", &self.config.source)
            .field("endpoints", &self.config.endpoints.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Cursor of a record: the first non-empty string among `fields`
fn cursor_of<'a>(record: &'a JsonValue, fields: &[String]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| record.get(field).and_then(JsonValue::as_str))
        .find(|value| !value.is_empty())
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
