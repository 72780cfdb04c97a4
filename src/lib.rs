// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # scope-extract
//!
//! Incremental extraction of paginated REST collections into object storage.
//!
//! ## Features
//!
//! - **Dependency Ordering**: Endpoints run after the endpoints they depend on
//! - **Incremental Runs**: A per-endpoint watermark advances only after a
//!   partition is fully published
//! - **Paginated Fetch**: Offset body or cursor query pagination with
//!   exponential backoff on transient failures
//! - **Normalization**: Punctuated boolean keys are renamed and dynamic maps
//!   flattened so records load into strict warehouse schemas
//! - **Object Storage Output**: Gzip NDJSON partitions plus `_SUCCESS`
//!   markers on GCS, S3, R2, Azure or a local path
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scope_extract::auth::provider_from_config;
//! use scope_extract::config::ExtractConfig;
//! use scope_extract::engine::Orchestrator;
//! use scope_extract::http::{ReqwestTransport, TransportConfig};
//! use scope_extract::output::ObjectStoreBlobStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> scope_extract::Result<()> {
//!     let config = ExtractConfig::from_file("extract.yaml")?;
//!     config.validate()?;
//!
//!     let transport = ReqwestTransport::new(&TransportConfig::from(&config.http))?;
//!     let credentials = provider_from_config(&config.credentials);
//!     let store = ObjectStoreBlobStore::parse(&config.bucket)?;
//!
//!     let summary = Orchestrator::new(
//!         config,
//!         Arc::new(transport),
//!         Arc::new(credentials),
//!         Arc::new(store),
//!     )
//!     .run()
//!     .await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Orchestrator                            │
//! │  resolve → per endpoint: watermark → fetch → normalize →        │
//! │            publish → watermark                                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │ Normalize │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Env var  │ GET/POST  │ Offset body   │ Key rename│ NDJSON gzip │
//! │ Secret   │ Retry     │ Cursor query  │ Map       │ _SUCCESS    │
//! │ file     │ Rate Limit│ Page ceiling  │ flatten   │ Watermarks  │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the extractor
pub mod error;

/// Common types and type aliases
pub mod types;

/// Run configuration
pub mod config;

/// Credential providers
pub mod auth;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Response body decoding
pub mod decode;

/// Pagination strategies and the page fetcher
pub mod pagination;

/// Record normalization
pub mod normalize;

/// Watermark persistence
pub mod state;

/// Blob storage and partition publication
pub mod output;

/// Endpoint dependency resolution
pub mod resolve;

/// Run orchestration
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::{EndpointSpec, ExtractConfig};
pub use engine::{ExtractionResult, Orchestrator, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
