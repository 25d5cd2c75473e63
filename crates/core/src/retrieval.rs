//! Download orchestration
//!
//! Resolves a storage URI and downloads either a single archive object or
//! every object under a key prefix. Prefix downloads rebuild the key layout
//! on disk and keep going past failed objects; the overall result is only
//! successful if every object arrived.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::client::StoreClient;
use crate::error::{Error, Result};
use crate::provenance::Provenance;
use crate::traits::ObjectStore;
use crate::uri::{StorageUri, parse_uri};

/// Object names containing this are fetched as a single archive object
pub const ARCHIVE_MARKER: &str = "tar.gz";

/// Leading key segments dropped when rebuilding local paths
pub const STRIPPED_KEY_SEGMENTS: usize = 2;

/// Outcome of one [`StoreClient::resolve_and_download`] call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub success: bool,
    /// Downloaded file or directory; empty if the URI was rejected
    pub local_path: PathBuf,
    /// Wall-clock time of the whole call
    pub elapsed_ms: u64,
    pub mime_type: String,
    pub content_length: i64,
}

impl DownloadResult {
    pub fn new(success: bool, local_path: impl Into<PathBuf>, elapsed_ms: u64) -> Self {
        Self {
            success,
            local_path: local_path.into(),
            elapsed_ms,
            mime_type: "unknown".to_string(),
            content_length: -1,
        }
    }

    /// Describe this download as a provenance record
    pub fn to_provenance(
        &self,
        input_file_path: &str,
        start_time: jiff::Timestamp,
        software_version: &str,
    ) -> Provenance {
        Provenance {
            activity_name: "Download S3 data".to_string(),
            activity_description: "Download data from S3 bucket".to_string(),
            start_time,
            processing_time_ms: self.elapsed_ms,
            software_version: software_version.to_string(),
            input_data: BTreeMap::from([(
                "input_file_path".to_string(),
                input_file_path.to_string(),
            )]),
            output_data: BTreeMap::from([(
                "file_path".to_string(),
                self.local_path.display().to_string(),
            )]),
        }
    }
}

/// Local path, relative to the download folder, for an object key
///
/// The first two key segments are dropped, the remaining ones become
/// directories and the last one the file name. Returns `Ok(None)` for
/// directory marker keys (ending in `/`) and an error for keys that would
/// resolve outside the download folder.
pub fn relative_key_path(key: &str) -> Result<Option<PathBuf>> {
    let segments: Vec<&str> = key.split('/').collect();
    let Some((file_name, dirs)) = segments.split_last() else {
        return Ok(None);
    };
    if file_name.is_empty() {
        return Ok(None);
    }

    let mut path = PathBuf::new();
    for segment in dirs.iter().skip(STRIPPED_KEY_SEGMENTS).chain([file_name]) {
        if segment.is_empty() {
            continue;
        }
        match Path::new(segment).components().next() {
            Some(Component::Normal(_)) if !segment.contains('\\') => path.push(segment),
            _ => {
                return Err(Error::General(format!(
                    "key '{key}' does not map to a path inside the output folder"
                )));
            }
        }
    }

    Ok(Some(path))
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl<S: ObjectStore> StoreClient<S> {
    /// Download whatever `storage_uri` points at into `output_folder`
    ///
    /// An object name containing `tar.gz` is downloaded as one file named
    /// after its last segment. Any other object name is treated as a prefix
    /// and every key under it is downloaded below
    /// `output_folder/<last segment>`. A malformed URI fails without any
    /// request being made.
    pub fn resolve_and_download(&self, storage_uri: &str, output_folder: &Path) -> DownloadResult {
        let start = Instant::now();
        tracing::info!("Downloading {storage_uri}");

        let (success, local_path) = match parse_uri(storage_uri) {
            Ok(uri) => {
                let output_path = output_folder.join(uri.basename());
                let success = self.download_uri(&uri, output_folder, &output_path);
                (success, output_path)
            }
            Err(e) => {
                tracing::error!("Invalid S3 URI: {e}");
                (false, PathBuf::new())
            }
        };

        DownloadResult::new(success, local_path, elapsed_ms(start))
    }

    fn download_uri(&self, uri: &StorageUri, output_folder: &Path, output_path: &Path) -> bool {
        tracing::info!(
            "Downloading {}:{} into {}",
            uri.bucket,
            uri.object_name,
            output_folder.display()
        );

        if !output_folder.exists() {
            tracing::info!("Output folder does not exist, creating it...");
            if let Err(e) = std::fs::create_dir_all(output_folder) {
                tracing::error!("Failed to create {}: {e}", output_folder.display());
                return false;
            }
        }

        if uri.object_name.contains(ARCHIVE_MARKER) {
            self.get(&uri.bucket, &uri.object_name, output_path)
        } else {
            self.download_prefix(&uri.bucket, &uri.object_name, output_path)
        }
    }

    /// Download every key under `prefix` into a tree rooted at `output_path`
    pub fn download_prefix(&self, bucket: &str, prefix: &str, output_path: &Path) -> bool {
        let mut success = true;
        let mut keys = Vec::new();
        for key in self.list(bucket, prefix) {
            match key {
                Ok(key) => keys.push(key),
                Err(e) => {
                    tracing::error!("Listing '{prefix}' in bucket '{bucket}' failed: {e}");
                    success = false;
                }
            }
        }

        if keys.is_empty() {
            tracing::error!("No content available in bucket '{bucket}' for prefix '{prefix}'.");
            return false;
        }

        for key in &keys {
            let relative = match relative_key_path(key) {
                Ok(Some(relative)) => relative,
                Ok(None) => {
                    tracing::debug!("Skipping directory marker {key}");
                    continue;
                }
                Err(e) => {
                    tracing::error!("{e}");
                    success = false;
                    continue;
                }
            };

            let target = output_path.join(relative);
            if let Some(parent) = target.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::error!("Failed to create {}: {e}", parent.display());
                    success = false;
                    continue;
                }
            }

            if !self.get(bucket, key, &target) {
                success = false;
            }
        }

        success
    }
}
