//! Gzip-compressed NDJSON buffer

use crate::error::{Error, Result};
use crate::types::JsonValue;
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Accumulates records as one compressed line-delimited payload
///
/// Records are compressed as they are written, so the buffer holds the
/// compressed size of one endpoint's output, not the raw JSON.
pub struct NdjsonGzipWriter {
    encoder: GzEncoder<Vec<u8>>,
    records: usize,
}

impl Default for NdjsonGzipWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl NdjsonGzipWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), Compression::default()),
            records: 0,
        }
    }

    /// Append one record as a line
    pub fn write_record(&mut self, record: &JsonValue) -> Result<()> {
        serde_json::to_writer(&mut self.encoder, record)?;
        self.encoder
            .write_all(b"\n")
            .map_err(|e| Error::Other(format!("Failed to compress record with gzip: {e}")))?;
        self.records += 1;
        Ok(())
    }

    /// Records written so far
    pub fn len(&self) -> usize {
        self.records
    }

    /// Whether no record has been written
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Finish the gzip stream and return the payload
    pub fn finish(self) -> Result<Bytes> {
        self.encoder
            .finish()
            .map(Bytes::from)
            .map_err(|e| Error::Other(format!("Failed to finish gzip compression: {e}")))
    }
}

impl std::fmt::Debug for NdjsonGzipWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdjsonGzipWriter")
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}
