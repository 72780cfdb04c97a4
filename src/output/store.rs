//! Blob storage (S3, R2, GCS, Azure, local, in-memory)

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::debug;

/// Storage the publisher and the watermark store write through
///
/// Keys are relative to the configured bucket and prefix.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether an object exists at `key`
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read an object as UTF-8 text
    async fn read_text(&self, key: &str) -> Result<String>;

    /// Write an object, replacing any previous one
    async fn write_bytes(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<()>;

    /// Full `scheme://bucket/key` address of an object, for logging
    fn uri(&self, key: &str) -> String;
}

/// `object_store`-backed blob store parsed from a bucket URL
#[derive(Debug, Clone)]
pub struct ObjectStoreBlobStore {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Bucket, container or local root, for addressing
    bucket: String,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme
    scheme: String,
}

impl ObjectStoreBlobStore {
    /// Wrap an existing store
    pub fn new(
        store: Arc<dyn ObjectStore>,
        scheme: impl Into<String>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
            scheme: scheme.into(),
        }
    }

    /// An empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory", "memory", "")
    }

    /// Parse a destination URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, prefix) = split_bucket(rest);
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;
            Ok(Self::new(Arc::new(store), "s3", bucket, prefix))
        } else if let Some(rest) = url.strip_prefix("r2://") {
            let (bucket, prefix) = split_bucket(rest);
            let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
            // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
            let store = builder
                .build()
                .map_err(|e| Error::config(format!("Failed to create r2 client: {e}")))?;
            Ok(Self::new(Arc::new(store), "r2", bucket, prefix))
        } else if let Some(rest) = url.strip_prefix("gs://") {
            let (bucket, prefix) = split_bucket(rest);
            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;
            Ok(Self::new(Arc::new(store), "gs", bucket, prefix))
        } else if let Some(rest) = url.strip_prefix("az://") {
            let (container, prefix) = split_bucket(rest);
            let store = MicrosoftAzureBuilder::from_env()
                .with_container_name(container)
                .build()
                .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;
            Ok(Self::new(Arc::new(store), "az", container, prefix))
        } else {
            Self::parse_local(url)
        }
    }

    /// Open a local directory, creating it if needed
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        if path.trim().is_empty() {
            return Err(Error::missing_field("bucket"));
        }

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::new(
            Arc::new(store),
            "file",
            path.trim_end_matches('/'),
            "",
        ))
    }

    /// Check if this is a cloud destination (not local or in-memory)
    pub fn is_cloud(&self) -> bool {
        !matches!(self.scheme.as_str(), "file" | "memory")
    }

    /// Get the scheme (s3, r2, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The underlying object store
    pub fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn path(&self, key: &str) -> ObjectPath {
        let key = key.trim_start_matches('/');
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{key}", self.prefix))
        }
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        match self.store.head(&self.path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_text(&self, key: &str) -> Result<String> {
        let bytes = self.store.get(&self.path(key)).await?.bytes().await?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::decode(format!("{} is not UTF-8: {e}", self.uri(key))))
    }

    async fn write_bytes(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<()> {
        let mut attributes = Attributes::new();
        // LocalFileSystem rejects puts carrying attributes
        if self.scheme != "file" {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            if let Some(encoding) = content_encoding {
                attributes.insert(Attribute::ContentEncoding, encoding.to_string().into());
            }
        }

        let size = data.len();
        let options = PutOptions {
            attributes,
            ..PutOptions::default()
        };
        self.store
            .put_opts(&self.path(key), PutPayload::from(data), options)
            .await
            .map_err(|e| Error::publish(self.uri(key), e.to_string()))?;

        debug!(uri = %self.uri(key), size, content_type, "Wrote object");
        Ok(())
    }

    fn uri(&self, key: &str) -> String {
        format!("{}://{}/{}", self.scheme, self.bucket, self.path(key))
    }
}

/// Split `bucket/some/prefix` into bucket and prefix
fn split_bucket(rest: &str) -> (&str, &str) {
    match rest.split_once('/') {
        Some((bucket, prefix)) => (bucket, prefix),
        None => (rest, ""),
    }
}
