//! dt-core: Core library for the dane-transfer client
//!
//! This crate provides the transfer layer between local file trees and an
//! object store, including:
//! - Storage URI parsing
//! - Mapping local paths onto object keys, optionally via a `.tar.gz` bundle
//! - Lazy paginated listing over the ObjectStore trait
//! - Clear-and-upload and download orchestration
//! - Configuration management
//!
//! This crate is independent of any specific S3 SDK. Every operation is
//! synchronous and runs on the calling thread.

pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod mapping;
pub mod provenance;
pub mod retrieval;
pub mod traits;
pub mod transfer;
pub mod uri;

#[cfg(any(test, feature = "test-export-mocks"))]
pub mod testing;

pub use archive::{ArchiveRequest, COMPRESSED_TAR_EXTENSION, build_archive, is_valid_archive_path};
pub use client::StoreClient;
pub use config::{Config, ConfigManager, StoreConfig};
pub use error::{Error, Result};
pub use listing::KeyListing;
pub use mapping::{FileKeyPair, asset_id, map_files};
pub use provenance::Provenance;
pub use retrieval::DownloadResult;
pub use traits::{ListOptions, ListingPage, ObjectStore};
pub use uri::{StorageUri, parse_uri, validate_uri};
