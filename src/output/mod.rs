//! Output module
//!
//! Handles blob storage and partition publication.
//!
//! # Overview
//!
//! This module provides:
//! - `BlobStore` - the storage seam, backed by `object_store` (S3, R2, GCS,
//!   Azure, local filesystem, in-memory)
//! - `NdjsonGzipWriter` - buffers records as gzip-compressed NDJSON
//! - `PartitionPath` - the `raw/<source>/<stateKey>/dt=/hr=/run=` layout
//! - `Publisher` - writes the data part, then the `_SUCCESS` marker

mod ndjson;
mod partition;
mod publisher;
mod store;

pub use ndjson::NdjsonGzipWriter;
pub use partition::PartitionPath;
pub use publisher::{PublishedPartition, Publisher, NDJSON_CONTENT_TYPE};
pub use store::{BlobStore, ObjectStoreBlobStore};

#[cfg(test)]
mod tests;
