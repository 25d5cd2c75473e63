//! Integration tests for the S3 store
//!
//! These tests require a running S3-compatible server and an existing bucket.
//!
//! Run with:
//! ```bash
//! docker run -d --name minio -p 9000:9000 minio/minio server /data
//! export TEST_S3_ENDPOINT=http://localhost:9000
//! export TEST_S3_ACCESS_KEY=minioadmin
//! export TEST_S3_SECRET_KEY=minioadmin
//! export TEST_S3_BUCKET=dt-test
//! cargo test -p dt-s3 --features integration
//! ```

#![cfg(feature = "integration")]

use std::time::{SystemTime, UNIX_EPOCH};

use dt_core::{StoreClient, StoreConfig};
use dt_s3::S3Store;
use tempfile::TempDir;

/// Get S3 test configuration from environment
fn test_client() -> Option<(StoreClient<S3Store>, String)> {
    let endpoint = std::env::var("TEST_S3_ENDPOINT").ok()?;
    let access_key = std::env::var("TEST_S3_ACCESS_KEY").ok()?;
    let secret_key = std::env::var("TEST_S3_SECRET_KEY").ok()?;
    let bucket = std::env::var("TEST_S3_BUCKET").unwrap_or_else(|_| "dt-test".to_string());

    let config = StoreConfig {
        endpoint: Some(endpoint),
        access_key: Some(access_key),
        secret_key: Some(secret_key),
        bucket_lookup: "path".to_string(),
        ..Default::default()
    };
    let store = S3Store::new(&config).ok()?;
    Some((StoreClient::new(store), bucket))
}

fn unique_prefix(name: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("it-{name}-{nanos}")
}

#[test]
fn test_transfer_then_download_round_trip() {
    let Some((client, bucket)) = test_client() else {
        eprintln!("Skipping: TEST_S3_* not set");
        return;
    };
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("asset");
    std::fs::create_dir_all(source.join("keyframes")).unwrap();
    std::fs::write(source.join("meta.json"), "{}").unwrap();
    std::fs::write(source.join("keyframes").join("1.jpg"), "jpg").unwrap();

    let prefix = unique_prefix("roundtrip");
    assert!(client
        .clear_and_transfer(&bucket, &prefix, &[&source], None)
        .unwrap());

    let keys: Vec<String> = client
        .list(&bucket, &prefix)
        .collect::<dt_core::Result<_>>()
        .unwrap();
    assert_eq!(keys.len(), 2);

    // Keys are <prefix>/asset/...; downloading the prefix strips two segments
    let output = temp_dir.path().join("download");
    let uri = format!("s3://{bucket}/{prefix}/asset");
    let result = client.resolve_and_download(&uri, &output);
    assert!(result.success);
    assert!(output.join("asset").join("keyframes").join("1.jpg").is_file());

    assert!(client.clear_prefix(&bucket, &prefix));
    assert_eq!(client.list(&bucket, &prefix).count(), 0);
}

#[test]
fn test_missing_object_download_fails() {
    let Some((client, bucket)) = test_client() else {
        eprintln!("Skipping: TEST_S3_* not set");
        return;
    };
    let temp_dir = TempDir::new().unwrap();
    let uri = format!("s3://{bucket}/{}/missing.tar.gz", unique_prefix("missing"));
    let result = client.resolve_and_download(&uri, temp_dir.path());
    assert!(!result.success);
}
