//! Error types for dt-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for dt-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dt-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file or credential error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed storage URI
    #[error("Invalid storage URI: {0}")]
    InvalidUri(String),

    /// Archive path with the wrong extension or a missing parent directory
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// Archive could not be created
    #[error("Archive error: {0}")]
    Archive(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication or permission failure reported by the store
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Bucket or object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (transient)
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidUri(_) | Error::InvalidArchivePath(_) => 2, // UsageError
            Error::Config(_) | Error::InvalidUrl(_) => 2,             // UsageError
            Error::Network(_) => 3,                                   // NetworkError
            Error::Auth(_) => 4,                                      // AuthError
            Error::NotFound(_) => 5,                                  // NotFound
            Error::Archive(_) => 6,                                   // TransferFailed
            _ => 1,                                                   // GeneralError
        }
    }

    /// Whether the failure may succeed if attempted again later.
    ///
    /// Nothing in this crate retries; callers that want to can use this to
    /// tell a dropped connection apart from a missing object or bad credentials.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Short label for the failure kind, used in log lines
    pub const fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidUrl(_) => "config",
            Error::InvalidUri(_) | Error::InvalidArchivePath(_) => "validation",
            Error::Archive(_) => "archive",
            Error::Io(_) => "io",
            Error::TomlParse(_) | Error::TomlSerialize(_) | Error::Json(_) => "encoding",
            Error::Auth(_) => "auth",
            Error::NotFound(_) => "not-found",
            Error::Network(_) => "network",
            Error::General(_) => "general",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidUri("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidArchivePath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Archive("test".into()).exit_code(), 6);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_only_network_errors_are_transient() {
        assert!(Error::Network("reset".into()).is_transient());
        assert!(!Error::Auth("denied".into()).is_transient());
        assert!(!Error::NotFound("key".into()).is_transient());
        assert!(!Error::Io(std::io::Error::other("disk")).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUri("ftp://bucket/obj".into());
        assert_eq!(err.to_string(), "Invalid storage URI: ftp://bucket/obj");

        let err = Error::NotFound("bucket/key".into());
        assert_eq!(err.to_string(), "Not found: bucket/key");
        assert_eq!(err.kind(), "not-found");
    }
}
