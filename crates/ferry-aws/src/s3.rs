//! S3 object store and presigner.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Builder, Credentials};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::DateTime;
use tracing::{debug, instrument, warn};
use url::Url;

use ferry_core::error::{InvalidInputError, StorageServiceError};
use ferry_core::{
    Config, FederatedCredentials, ObjectKey, ObjectListing, ObjectRecord, ObjectStore, Result,
    StorageProvider,
};

use crate::error::storage_error;
use crate::sdk::sdk_config;

const PROVIDER_NAME: &str = "ferry-identity-pool";

/// Builds S3 clients bound to federated credentials.
#[derive(Clone)]
pub struct S3Provider {
    sdk_config: SdkConfig,
    bucket: String,
    path_style: bool,
}

impl S3Provider {
    /// Endpoint overrides use path-style addressing, which emulators expect.
    pub fn new(config: &Config) -> Self {
        Self {
            sdk_config: sdk_config(config),
            bucket: config.storage.bucket.clone(),
            path_style: config.endpoint_url.is_some(),
        }
    }
}

impl StorageProvider for S3Provider {
    type Client = S3Store;

    fn connect(&self, credentials: FederatedCredentials) -> Result<S3Store> {
        let static_credentials = Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            Some(credentials.session_token().to_string()),
            credentials.expiration().map(SystemTime::from),
            PROVIDER_NAME,
        );

        let s3_config = Builder::from(&self.sdk_config)
            .credentials_provider(static_credentials)
            .force_path_style(self.path_style)
            .build();

        Ok(S3Store {
            client: Client::from_conf(s3_config),
            bucket: self.bucket.clone(),
        })
    }
}

impl std::fmt::Debug for S3Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Provider")
            .field("bucket", &self.bucket)
            .field("path_style", &self.path_style)
            .finish()
    }
}

/// An S3 client for one bucket and one set of credentials.
pub struct S3Store {
    client: Client,
    bucket: String,
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, %key, size = bytes.len()))]
    async fn put_object(&self, key: &ObjectKey, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_objects(&self) -> Result<ObjectListing> {
        let output = self
            .client
            .list_objects()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(storage_error)?;

        let records = output
            .contents()
            .iter()
            .filter_map(|object| {
                let raw = object.key()?;
                let key = match ObjectKey::new(raw) {
                    Ok(key) => key,
                    Err(e) => {
                        warn!(key = raw, error = %e, "Skipping unaddressable object");
                        return None;
                    }
                };
                Some(ObjectRecord {
                    key,
                    size: object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                    last_modified: object
                        .last_modified()
                        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                })
            })
            .collect();

        Ok(ObjectListing {
            records,
            truncated: output.is_truncated().unwrap_or(false),
        })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, %key))]
    async fn delete_object(&self, key: &ObjectKey) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, %key))]
    async fn presign_get(&self, key: &ObjectKey, expires_in: Duration) -> Result<Url> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|e| {
            StorageServiceError::Signing {
                message: e.to_string(),
            }
        })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .presigned(presigning)
            .await
            .map_err(|e| StorageServiceError::Signing {
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!("Presigned GET");
        Url::parse(request.uri()).map_err(|e| {
            InvalidInputError::Url {
                value: request.uri().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store").field("bucket", &self.bucket).finish()
    }
}
