//! S3 store implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from dt-core.
//! The SDK is async; every call is driven to completion on a private
//! current-thread Tokio runtime so callers see plain blocking calls.
//! Methods must not be called from inside another Tokio runtime.

use std::future::Future;
use std::path::Path;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;

use dt_core::{Error, ListOptions, ListingPage, ObjectStore, Result, StoreConfig};

/// Error codes the store uses for missing buckets and keys
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NoSuchBucket", "NotFound"];

/// Error codes the store uses for rejected credentials or permissions
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "InvalidToken",
];

/// Blocking S3 store
pub struct S3Store {
    inner: aws_sdk_s3::Client,
    runtime: Runtime,
}

impl S3Store {
    /// Create a new store from connection settings
    ///
    /// Static credentials from the settings take precedence; otherwise the
    /// AWS default credential chain is used. Missing credentials only show
    /// up as an error on the first request.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("Failed to start runtime: {e}")))?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some((access_key, secret_key)) = config.static_credentials() {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "dt-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = runtime.block_on(loader.load());

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style())
            .build();

        tracing::debug!(
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            region = %config.region,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            runtime,
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}

/// Map an SDK failure onto the core error kinds
fn classify<E, R>(err: SdkError<E, R>, target: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = format!("{target}: {}", DisplayErrorContext(&err));

    match code.as_deref() {
        Some(c) if NOT_FOUND_CODES.contains(&c) => Error::NotFound(target.to_string()),
        Some(c) if AUTH_CODES.contains(&c) => Error::Auth(message),
        _ => match err {
            SdkError::ConstructionFailure(_) => Error::Config(message),
            SdkError::ServiceError(_) => Error::General(message),
            _ => Error::Network(message),
        },
    }
}

impl ObjectStore for S3Store {
    fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListingPage> {
        let mut request = self.inner.list_objects().bucket(bucket);

        if let Some(prefix) = &options.prefix {
            request = request.prefix(prefix);
        }

        if let Some(marker) = &options.marker {
            request = request.marker(marker);
        }

        let response = self
            .block_on(request.send())
            .map_err(|e| classify(e, bucket))?;

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        tracing::debug!(
            "Listed {} key(s) in bucket '{bucket}' after {:?}",
            keys.len(),
            options.marker
        );

        Ok(ListingPage {
            truncated: response.is_truncated().unwrap_or(false),
            keys,
        })
    }

    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>> {
        if keys.is_empty() {
            return Ok(vec![]);
        }

        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::General(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .block_on(
                self.inner
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send(),
            )
            .map_err(|e| classify(e, bucket))?;

        if !response.errors().is_empty() {
            let failed: Vec<String> = response
                .errors()
                .iter()
                .map(|e| {
                    format!(
                        "{} ({})",
                        e.key().unwrap_or_default(),
                        e.code().unwrap_or("unknown")
                    )
                })
                .collect();
            return Err(Error::General(format!(
                "Failed to delete {} object(s) from bucket '{bucket}': {}",
                failed.len(),
                failed.join(", ")
            )));
        }

        Ok(response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(str::to_string))
            .collect())
    }

    fn put_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let target = format!("{bucket}/{key}");
        let size = std::fs::metadata(local_path)?.len();
        let content_type = mime_guess::from_path(local_path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        self.block_on(async {
            let body = ByteStream::from_path(local_path)
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e)))?;

            self.inner
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .content_type(content_type)
                .send()
                .await
                .map_err(|e| classify(e, &target))?;

            Ok::<_, Error>(size)
        })
    }

    fn get_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<u64> {
        let target = format!("{bucket}/{key}");

        self.block_on(async {
            let response = self
                .inner
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| classify(e, &target))?;

            // Stream straight to disk; archives can be larger than memory
            let mut body = response.body.into_async_read();
            let mut file = tokio::fs::File::create(local_path).await?;
            let written = tokio::io::copy(&mut body, &mut file)
                .await
                .map_err(|e| Error::Network(format!("{target}: {e}")))?;
            file.flush().await?;

            Ok::<_, Error>(written)
        })
    }
}
