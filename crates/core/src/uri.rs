//! Storage URI parsing
//!
//! Handles URIs of the form `s3://bucket/object_name`. The object name may be
//! a single key (`prefix/archive.tar.gz`) or a prefix shared by many keys.

use crate::error::{Error, Result};

/// Scheme every storage URI must start with
pub const S3_SCHEME: &str = "s3://";

/// A parsed storage URI pointing to an S3 location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    /// Bucket name
    pub bucket: String,
    /// Object key or key prefix (never empty)
    pub object_name: String,
}

impl StorageUri {
    /// Create a new StorageUri
    pub fn new(bucket: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object_name: object_name.into(),
        }
    }

    /// Last path segment of the object name
    pub fn basename(&self) -> &str {
        key_basename(&self.object_name)
    }
}

impl std::fmt::Display for StorageUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{S3_SCHEME}{}/{}", self.bucket, self.object_name)
    }
}

impl std::str::FromStr for StorageUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_uri(s)
    }
}

/// Check whether a string is a usable storage URI, logging the reason if not
pub fn validate_uri(uri: &str) -> bool {
    match parse_uri(uri) {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("{e}");
            false
        }
    }
}

/// Parse a storage URI into bucket and object name
///
/// The bucket is everything between the scheme and the first `/`; the object
/// name is everything after it.
pub fn parse_uri(uri: &str) -> Result<StorageUri> {
    let rest = uri
        .strip_prefix(S3_SCHEME)
        .ok_or_else(|| Error::InvalidUri(format!("'{uri}' must start with {S3_SCHEME}")))?;

    let (bucket, object_name) = rest
        .split_once('/')
        .ok_or_else(|| Error::InvalidUri(format!("no object name specified in '{uri}'")))?;

    if bucket.is_empty() {
        return Err(Error::InvalidUri(format!("no bucket specified in '{uri}'")));
    }

    if object_name.is_empty() {
        return Err(Error::InvalidUri(format!("no object name specified in '{uri}'")));
    }

    Ok(StorageUri::new(bucket, object_name))
}

/// Last `/`-separated segment of an object key
pub fn key_basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uri() {
        assert!(validate_uri("s3://bucket/obj"));
        assert!(!validate_uri("ftp://bucket/obj"));
        assert!(!validate_uri("s3://bucket"));
    }

    #[test]
    fn test_validate_uri_rejects_empty_parts() {
        assert!(!validate_uri("s3://bucket/"));
        assert!(!validate_uri("s3:///obj"));
        assert!(!validate_uri(""));
    }

    #[test]
    fn test_parse_uri() {
        let uri = parse_uri("s3://beng-daan-visxp/jaap-dane-test/dane-test.tar.gz").unwrap();
        assert_eq!(uri.bucket, "beng-daan-visxp");
        assert_eq!(uri.object_name, "jaap-dane-test/dane-test.tar.gz");
        assert_eq!(uri.basename(), "dane-test.tar.gz");
    }

    #[test]
    fn test_parse_uri_keeps_nested_object_name() {
        let uri: StorageUri = "s3://bucket/a/b/c/".parse().unwrap();
        assert_eq!(uri.bucket, "bucket");
        assert_eq!(uri.object_name, "a/b/c/");
        assert_eq!(uri.basename(), "");
    }

    #[test]
    fn test_parse_uri_errors() {
        let err = parse_uri("ftp://bucket/obj").unwrap_err();
        assert!(matches!(err, Error::InvalidUri(_)));

        let err = parse_uri("s3://bucket").unwrap_err();
        assert!(err.to_string().contains("no object name"));
    }

    #[test]
    fn test_storage_uri_display() {
        let uri = StorageUri::new("bucket", "prefix/file.txt");
        assert_eq!(uri.to_string(), "s3://bucket/prefix/file.txt");
    }

    #[test]
    fn test_key_basename() {
        assert_eq!(key_basename("a/b/c.jpg"), "c.jpg");
        assert_eq!(key_basename("c.jpg"), "c.jpg");
    }
}
