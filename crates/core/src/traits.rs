//! ObjectStore trait definition
//!
//! This trait covers the four remote operations the transfer layer consumes.
//! It keeps the orchestration code independent of the S3 SDK and can be
//! mocked for testing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One page of a key listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage {
    /// Keys in this page, in store order
    pub keys: Vec<String>,

    /// Whether more keys remain after this page
    pub truncated: bool,
}

impl ListingPage {
    /// A final page holding `keys`
    pub fn last(keys: Vec<String>) -> Self {
        Self {
            keys,
            truncated: false,
        }
    }

    /// A truncated page holding `keys`
    pub fn partial(keys: Vec<String>) -> Self {
        Self {
            keys,
            truncated: true,
        }
    }

    /// Marker for the next request: the last key of a truncated page
    ///
    /// `None` once the listing is complete, or if a truncated page came back
    /// empty and there is nothing to resume after.
    pub fn next_marker(&self) -> Option<&str> {
        if self.truncated {
            self.keys.last().map(String::as_str)
        } else {
            None
        }
    }
}

/// Options for a single list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: Option<String>,

    /// Start listing after this key
    pub marker: Option<String>,
}

/// Trait for the remote object store
///
/// Every call is a blocking round trip. Implementations report failures as
/// typed errors; nothing here retries.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys in a bucket
    fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListingPage>;

    /// Delete a batch of keys, returning the keys the store reports as deleted
    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>>;

    /// Upload a local file, returning the number of bytes sent
    fn put_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64>;

    /// Download an object into a local file, returning the number of bytes written
    fn get_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64>;
}
