//! Watermark persistence

use super::types::Watermark;
use crate::error::{Error, Result};
use crate::output::BlobStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Persists one cursor per endpoint key
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Persisted cursor for `key`, or `default` when none exists
    async fn read(&self, key: &str, default: &str) -> Result<String>;

    /// Replace the cursor for `key`
    async fn write(&self, key: &str, cursor: &str) -> Result<()>;
}

/// Watermarks stored as JSON objects in a blob store
#[derive(Clone)]
pub struct BlobWatermarkStore {
    store: Arc<dyn BlobStore>,
    source: String,
}

impl BlobWatermarkStore {
    /// Create a store writing under `state/<source>/`
    pub fn new(store: Arc<dyn BlobStore>, source: impl Into<String>) -> Self {
        Self {
            store,
            source: source.into(),
        }
    }

    /// Object key holding the watermark for an endpoint
    pub fn key_for(&self, key: &str) -> String {
        format!("state/{}/{key}.json", self.source)
    }
}

impl std::fmt::Debug for BlobWatermarkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobWatermarkStore")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WatermarkStore for BlobWatermarkStore {
    async fn read(&self, key: &str, default: &str) -> Result<String> {
        let path = self.key_for(key);
        if !self.store.exists(&path).await? {
            debug!(key, default, "No watermark stored, using default");
            return Ok(default.to_string());
        }

        let contents = self.store.read_text(&path).await?;
        let watermark: Watermark = serde_json::from_str(&contents).map_err(|e| {
            Error::state(format!(
                "Failed to parse watermark {}: {e}",
                self.store.uri(&path)
            ))
        })?;

        if watermark.updated_after.trim().is_empty() {
            return Ok(default.to_string());
        }
        Ok(watermark.updated_after)
    }

    async fn write(&self, key: &str, cursor: &str) -> Result<()> {
        let path = self.key_for(key);
        let contents = serde_json::to_vec(&Watermark::new(cursor))?;
        self.store
            .write_bytes(&path, Bytes::from(contents), "application/json", None)
            .await
            .map_err(|e| Error::state(format!("Failed to write watermark: {e}")))?;

        debug!(key, cursor, "Watermark written");
        Ok(())
    }
}
