//! Store client
//!
//! Wraps an [`ObjectStore`] backend with the operations the orchestrators
//! build on: a lazy key listing, and put/get/delete calls that log any
//! failure and report it as `false`.

use std::path::Path;

use crate::listing::KeyListing;
use crate::traits::ObjectStore;

/// Client over an object store backend
#[derive(Debug)]
pub struct StoreClient<S> {
    store: S,
}

impl<S: ObjectStore> StoreClient<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the underlying backend
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Lazily list every key under `prefix`
    pub fn list(&self, bucket: &str, prefix: &str) -> KeyListing<'_, S> {
        KeyListing::new(&self.store, bucket, prefix)
    }

    /// Delete a batch of keys
    pub fn delete(&self, bucket: &str, keys: &[String]) -> bool {
        if keys.is_empty() {
            return true;
        }

        match self.store.delete_objects(bucket, keys) {
            Ok(deleted) => {
                tracing::debug!(
                    "Deleted {} of {} key(s) from bucket '{bucket}'",
                    deleted.len(),
                    keys.len()
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    "Failed to delete {} key(s) from bucket '{bucket}': {e}",
                    keys.len()
                );
                false
            }
        }
    }

    /// Upload `local_path` to `bucket/key`
    pub fn put(&self, bucket: &str, key: &str, local_path: &Path) -> bool {
        match self.store.put_object(bucket, key, local_path) {
            Ok(size) => {
                tracing::info!(
                    "Uploaded {} -> {bucket}/{key} ({})",
                    local_path.display(),
                    humansize::format_size(size, humansize::BINARY)
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    transient = e.is_transient(),
                    "Failed to upload {}: {e}",
                    local_path.display()
                );
                false
            }
        }
    }

    /// Download `bucket/key` into `local_path`
    pub fn get(&self, bucket: &str, key: &str, local_path: &Path) -> bool {
        match self.store.get_object(bucket, key, local_path) {
            Ok(size) => {
                tracing::info!(
                    "Downloaded {bucket}/{key} -> {} ({})",
                    local_path.display(),
                    humansize::format_size(size, humansize::BINARY)
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    kind = e.kind(),
                    transient = e.is_transient(),
                    "Failed to download {key} from bucket {bucket}: {e}"
                );
                false
            }
        }
    }
}
