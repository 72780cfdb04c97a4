//! Partition publication
//!
//! The data part is written first and the zero-byte `_SUCCESS` marker second,
//! so a partition never looks complete before its data exists.

use super::ndjson::NdjsonGzipWriter;
use super::partition::PartitionPath;
use super::store::BlobStore;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::sync::Arc;
use tracing::info;

/// Content type of the data part
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Content type of the marker
const MARKER_CONTENT_TYPE: &str = "application/octet-stream";

/// What a publish wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPartition {
    /// Address of the data part
    pub data_uri: String,
    /// Address of the marker
    pub marker_uri: String,
    /// Records in the data part
    pub records: usize,
    /// Compressed size of the data part
    pub bytes: usize,
}

/// Writes partitions to a blob store
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn BlobStore>,
}

impl Publisher {
    /// Create a publisher over a store
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Publish a buffered partition
    ///
    /// Returns `None` without touching storage when the buffer holds no
    /// records. Any storage failure is reported as `Error::Publish`.
    pub async fn publish(
        &self,
        partition: &PartitionPath,
        buffer: NdjsonGzipWriter,
    ) -> Result<Option<PublishedPartition>> {
        if buffer.is_empty() {
            return Ok(None);
        }

        let records = buffer.len();
        let data_key = partition.data_key();
        let payload = buffer
            .finish()
            .map_err(|e| Error::publish(self.store.uri(&data_key), e.to_string()))?;
        let bytes = payload.len();

        self.store
            .write_bytes(&data_key, payload, NDJSON_CONTENT_TYPE, Some("gzip"))
            .await
            .map_err(|e| as_publish_error(e, self.store.uri(&data_key)))?;

        let marker_key = partition.marker_key();
        self.store
            .write_bytes(&marker_key, Bytes::new(), MARKER_CONTENT_TYPE, None)
            .await
            .map_err(|e| as_publish_error(e, self.store.uri(&marker_key)))?;

        let published = PublishedPartition {
            data_uri: self.store.uri(&data_key),
            marker_uri: self.store.uri(&marker_key),
            records,
            bytes,
        };
        info!(uri = %published.data_uri, records, bytes, "Published partition");
        Ok(Some(published))
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").finish_non_exhaustive()
    }
}

fn as_publish_error(error: Error, uri: String) -> Error {
    match error {
        Error::Publish { .. } => error,
        other => Error::publish(uri, other.to_string()),
    }
}
