//! Tests for output module

use super::*;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use flate2::read::GzDecoder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, ObjectStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Read;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn partition() -> PartitionPath {
    let started = Utc.with_ymd_and_hms(2025, 3, 10, 8, 15, 0).unwrap();
    PartitionPath::new("scope", "companies_search", started, "20250310T081500Z")
}

fn gunzip_lines(data: &[u8]) -> Vec<serde_json::Value> {
    let mut text = String::new();
    GzDecoder::new(data).read_to_string(&mut text).unwrap();
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn buffer_with(count: usize) -> NdjsonGzipWriter {
    let mut buffer = NdjsonGzipWriter::new();
    for i in 0..count {
        buffer.write_record(&json!({"id": i})).unwrap();
    }
    buffer
}

// ============================================================================
// Partition Layout
// ============================================================================

#[test]
fn test_partition_keys() {
    let partition = partition();
    assert_eq!(
        partition.dir(),
        "raw/scope/companies_search/dt=2025-03-10/hr=08/run=20250310T081500Z"
    );
    assert_eq!(
        partition.data_key(),
        "raw/scope/companies_search/dt=2025-03-10/hr=08/run=20250310T081500Z/part-00000.json.gz"
    );
    assert_eq!(
        partition.marker_key(),
        "raw/scope/companies_search/dt=2025-03-10/hr=08/run=20250310T081500Z/_SUCCESS"
    );
}

#[test]
fn test_distinct_runs_get_distinct_partitions() {
    let started = Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 59).unwrap();
    let a = PartitionPath::new("scope", "tasks", started, "run-a");
    let b = PartitionPath::new("scope", "tasks", started, "run-b");
    assert_ne!(a.data_key(), b.data_key());
    assert!(a.dir().contains("hr=23"));
}

// ============================================================================
// NDJSON Buffer
// ============================================================================

#[test]
fn test_ndjson_gzip_lines() {
    let mut buffer = NdjsonGzipWriter::new();
    assert!(buffer.is_empty());

    buffer.write_record(&json!({"id": 1, "nested": {"a": [1, 2]}})).unwrap();
    buffer.write_record(&json!({"id": 2, "text": "line\nbreak"})).unwrap();
    assert_eq!(buffer.len(), 2);

    let payload = buffer.finish().unwrap();
    assert_eq!(&payload[..2], &[0x1f, 0x8b]);
    assert_eq!(
        gunzip_lines(&payload),
        vec![
            json!({"id": 1, "nested": {"a": [1, 2]}}),
            json!({"id": 2, "text": "line\nbreak"})
        ]
    );
}

// ============================================================================
// Blob Store
// ============================================================================

#[tokio::test]
async fn test_in_memory_store_roundtrip() {
    let store = ObjectStoreBlobStore::in_memory();
    assert!(!store.exists("state/scope/a.json").await.unwrap());

    store
        .write_bytes(
            "state/scope/a.json",
            Bytes::from_static(b"{}"),
            "application/json",
            None,
        )
        .await
        .unwrap();

    assert!(store.exists("state/scope/a.json").await.unwrap());
    assert_eq!(store.read_text("state/scope/a.json").await.unwrap(), "{}");
    assert!(!store.is_cloud());
}

#[tokio::test]
async fn test_read_missing_object_fails() {
    let store = ObjectStoreBlobStore::in_memory();
    let err = store.read_text("absent").await.unwrap_err();
    assert!(matches!(err, Error::ObjectStore(_)));
}

#[tokio::test]
async fn test_prefix_and_uri() {
    let memory = Arc::new(InMemory::new());
    let store = ObjectStoreBlobStore::new(memory.clone(), "gs", "scope-ws-extract", "/exports/");
    assert_eq!(
        store.uri("raw/x/_SUCCESS"),
        "gs://scope-ws-extract/exports/raw/x/_SUCCESS"
    );
    assert!(store.is_cloud());

    store
        .write_bytes("raw/x/_SUCCESS", Bytes::new(), "text/plain", None)
        .await
        .unwrap();
    memory
        .head(&ObjectPath::from("exports/raw/x/_SUCCESS"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_local_store() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("bucket");
    let store = ObjectStoreBlobStore::parse(root.to_str().unwrap()).unwrap();
    assert_eq!(store.scheme(), "file");

    // Content metadata is dropped for the local filesystem
    store
        .write_bytes(
            "raw/scope/a/part-00000.json.gz",
            Bytes::from_static(b"data"),
            NDJSON_CONTENT_TYPE,
            Some("gzip"),
        )
        .await
        .unwrap();
    assert!(root.join("raw/scope/a/part-00000.json.gz").exists());
    assert!(store.uri("k").starts_with("file://"));
}

#[test]
fn test_parse_file_url_and_empty_path() {
    let dir = tempdir().unwrap();
    let url = format!("file://{}", dir.path().display());
    assert_eq!(ObjectStoreBlobStore::parse(&url).unwrap().scheme(), "file");

    assert!(ObjectStoreBlobStore::parse("").is_err());
}

// ============================================================================
// Publisher
// ============================================================================

#[tokio::test]
async fn test_publish_writes_data_then_marker() {
    let memory = Arc::new(InMemory::new());
    let store = Arc::new(ObjectStoreBlobStore::new(memory.clone(), "memory", "m", ""));
    let publisher = Publisher::new(store.clone());
    let partition = partition();

    let published = publisher
        .publish(&partition, buffer_with(3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(published.records, 3);
    assert!(published.data_uri.ends_with("part-00000.json.gz"));
    assert!(published.marker_uri.ends_with("_SUCCESS"));

    let data = memory
        .get(&ObjectPath::from(partition.data_key()))
        .await
        .unwrap();
    assert_eq!(
        data.attributes.get(&Attribute::ContentType).map(AsRef::<str>::as_ref),
        Some("application/x-ndjson")
    );
    assert_eq!(
        data.attributes.get(&Attribute::ContentEncoding).map(AsRef::<str>::as_ref),
        Some("gzip")
    );
    let payload = data.bytes().await.unwrap();
    assert_eq!(payload.len(), published.bytes);
    assert_eq!(gunzip_lines(&payload).len(), 3);

    let marker = memory
        .get(&ObjectPath::from(partition.marker_key()))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert!(marker.is_empty());
}

#[tokio::test]
async fn test_publish_nothing_for_empty_buffer() {
    let store = Arc::new(ObjectStoreBlobStore::in_memory());
    let publisher = Publisher::new(store.clone());
    let partition = partition();

    let published = publisher
        .publish(&partition, NdjsonGzipWriter::new())
        .await
        .unwrap();
    assert!(published.is_none());
    assert!(!store.exists(&partition.data_key()).await.unwrap());
    assert!(!store.exists(&partition.marker_key()).await.unwrap());
}

/// Store that rejects writes to keys containing a pattern
struct FailingStore {
    fail_on: &'static str,
    written: Mutex<Vec<String>>,
}

#[async_trait]
impl BlobStore for FailingStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.written.lock().unwrap().iter().any(|k| k == key))
    }

    async fn read_text(&self, _key: &str) -> Result<String> {
        Err(Error::Other("unsupported".into()))
    }

    async fn write_bytes(
        &self,
        key: &str,
        _data: Bytes,
        _content_type: &str,
        _content_encoding: Option<&str>,
    ) -> Result<()> {
        if key.contains(self.fail_on) {
            return Err(Error::Other("permission denied".into()));
        }
        self.written.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn uri(&self, key: &str) -> String {
        format!("mock://bucket/{key}")
    }
}

#[tokio::test]
async fn test_data_failure_leaves_no_marker() {
    let store = Arc::new(FailingStore {
        fail_on: "part-00000",
        written: Mutex::new(Vec::new()),
    });
    let publisher = Publisher::new(store.clone());

    let err = publisher
        .publish(&partition(), buffer_with(1))
        .await
        .unwrap_err();
    match err {
        Error::Publish { path, message } => {
            assert!(path.starts_with("mock://bucket/raw/scope/"));
            assert!(message.contains("permission denied"));
        }
        other => panic!("expected publish error, got {other:?}"),
    }
    assert!(store.written.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_marker_failure_is_publish_error() {
    let store = Arc::new(FailingStore {
        fail_on: "_SUCCESS",
        written: Mutex::new(Vec::new()),
    });
    let publisher = Publisher::new(store.clone());

    let err = publisher
        .publish(&partition(), buffer_with(1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Publish { .. }));
    assert_eq!(store.written.lock().unwrap().len(), 1);
}
