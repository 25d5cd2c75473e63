//! Upload orchestration
//!
//! A transfer replaces everything under a key prefix: the prefix is cleared
//! first, then the mapped file set is uploaded one object at a time. The
//! first failed upload aborts the transfer. Objects uploaded before that
//! stay in place, and nothing stops another writer from using the prefix
//! between the clear and the uploads.

use std::path::Path;

use crate::client::StoreClient;
use crate::error::Result;
use crate::mapping::map_files;
use crate::traits::ObjectStore;

/// Maximum number of keys in one DeleteObjects request
pub const MAX_DELETE_BATCH: usize = 1000;

impl<S: ObjectStore> StoreClient<S> {
    /// Delete every key under `prefix`
    ///
    /// Keys are deleted in batches; the listing is requested again after each
    /// batch until it comes back empty. Returns false if listing or deleting
    /// fails, or if a batch did not remove anything.
    pub fn clear_prefix(&self, bucket: &str, prefix: &str) -> bool {
        let mut previous: Option<Vec<String>> = None;
        let mut removed = 0;

        loop {
            let mut batch = Vec::new();
            for key in self.list(bucket, prefix).take(MAX_DELETE_BATCH) {
                match key {
                    Ok(key) => batch.push(key),
                    Err(e) => {
                        tracing::error!("Failed to list '{prefix}' in bucket '{bucket}': {e}");
                        return false;
                    }
                }
            }

            if batch.is_empty() {
                if removed > 0 {
                    tracing::info!("Cleared {removed} key(s) under '{prefix}' in bucket '{bucket}'");
                }
                return true;
            }

            if previous.as_ref() == Some(&batch) {
                tracing::error!(
                    "Keys under '{prefix}' in bucket '{bucket}' are still listed after deletion"
                );
                return false;
            }

            if removed == 0 {
                tracing::warn!("Prefix '{prefix}' exists in bucket '{bucket}'.");
            }
            tracing::warn!(
                "Removing {} item(s) with '{prefix}' as prefix from bucket '{bucket}'.",
                batch.len()
            );
            if !self.delete(bucket, &batch) {
                return false;
            }

            removed += batch.len();
            previous = Some(batch);
        }
    }

    /// Replace the contents of `prefix` with `file_list`
    ///
    /// With `archive_path` the list is uploaded as a single `.tar.gz` object,
    /// otherwise directory structure is kept in the keys. Returns `Ok(true)`
    /// only if every object was uploaded; an archive that cannot be built is
    /// returned as an error.
    pub fn clear_and_transfer<P: AsRef<Path>>(
        &self,
        bucket: &str,
        prefix: &str,
        file_list: &[P],
        archive_path: Option<&Path>,
    ) -> Result<bool> {
        if !self.clear_prefix(bucket, prefix) {
            tracing::error!("Could not clear '{prefix}' in bucket '{bucket}', not transferring");
            return Ok(false);
        }

        let pairs = map_files(file_list, prefix, archive_path)?;
        tracing::info!(
            "Transferring {} file(s) to bucket '{bucket}' under '{prefix}'",
            pairs.len()
        );

        for pair in &pairs {
            if !self.put(bucket, &pair.remote_key, &pair.local_path) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
