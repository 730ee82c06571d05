//! File-backed bucket.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tracing::{debug, instrument};
use url::Url;

use ferry_core::error::{InvalidInputError, ServiceFault, StorageServiceError};
use ferry_core::{
    Error, FederatedCredentials, ObjectKey, ObjectListing, ObjectRecord, ObjectStore, Result,
    StorageProvider,
};

use crate::signing::{Signer, TokenKind, TokenRejection};
use crate::store::FileStore;

/// Most records returned by one listing, matching S3's page size.
const LIST_PAGE_SIZE: usize = 1000;

const LINK_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// The string a download link's signature covers.
fn link_canonical(bucket: &str, key: &str, credential: &str, date: &str, expires: &str) -> String {
    format!("{}\n{}\n{}\n{}\n{}", bucket, key, credential, date, expires)
}

fn link_rejected(code: &str, message: impl Into<String>) -> Error {
    StorageServiceError::Rejected(ServiceFault::coded(code, message)).into()
}

fn signature_mismatch() -> Error {
    link_rejected(
        "SignatureDoesNotMatch",
        "The request signature we calculated does not match the signature you provided.",
    )
}

fn storage_io(err: io::Error) -> Error {
    StorageServiceError::Transport {
        message: format!("IO error: {}", err),
    }
    .into()
}

/// Connects [`FileObjectStore`] clients to one local bucket.
#[derive(Debug, Clone)]
pub struct FileStorageProvider {
    store: FileStore,
    bucket: String,
}

impl FileStorageProvider {
    pub fn new(store: FileStore, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }
}

impl FileStorageProvider {
    /// Check a link signed by [`FileObjectStore::presign_get`] and return
    /// the key it grants.
    ///
    /// # Errors
    ///
    /// `SignatureDoesNotMatch` for a tampered or foreign link,
    /// `AccessDenied` once its window has passed, and
    /// `AuthorizationQueryParametersError` when a parameter is missing.
    #[instrument(skip(self, url), fields(bucket = %self.bucket))]
    pub async fn verify_link(&self, url: &Url) -> Result<ObjectKey> {
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let param = |name: &str| {
            query.get(name).map(String::as_str).ok_or_else(|| {
                link_rejected(
                    "AuthorizationQueryParametersError",
                    format!("Query-string authentication requires the {} parameter", name),
                )
            })
        };

        let key = param("X-Ferry-Key")?;
        let credential = param("X-Ferry-Credential")?;
        let date = param("X-Ferry-Date")?;
        let expires = param("X-Ferry-Expires")?;
        let signature = hex::decode(param("X-Ferry-Signature")?).map_err(|_| signature_mismatch())?;

        let signer = Signer::new(self.store.signing_key().await.map_err(storage_io)?);
        let canonical = link_canonical(&self.bucket, key, credential, date, expires);
        if !signer.verify_bytes(canonical.as_bytes(), &signature) {
            return Err(signature_mismatch());
        }

        let expected = self.store.object_path(&self.bucket, key);
        if url.to_file_path().ok() != Some(expected) {
            return Err(signature_mismatch());
        }

        let signed_at = NaiveDateTime::parse_from_str(date, LINK_DATE_FORMAT)
            .map_err(|_| signature_mismatch())?
            .and_utc();
        let window: i64 = expires.parse().map_err(|_| signature_mismatch())?;
        if Utc::now() >= signed_at + chrono::Duration::seconds(window) {
            return Err(link_rejected("AccessDenied", "Request has expired"));
        }

        ObjectKey::new(key)
    }
}

impl StorageProvider for FileStorageProvider {
    type Client = FileObjectStore;

    /// Accepts only credentials whose session token was issued by the
    /// local broker and has not expired.
    fn connect(&self, credentials: FederatedCredentials) -> Result<FileObjectStore> {
        // Cached by the broker's exchange on the same store.
        let signer = Signer::new(self.store.signing_key_blocking().map_err(storage_io)?);

        signer
            .verify(credentials.session_token(), TokenKind::Storage)
            .map_err(|rejection| {
                let fault = match rejection {
                    TokenRejection::Expired => {
                        ServiceFault::coded("ExpiredToken", "The provided token has expired.")
                    }
                    _ => ServiceFault::coded("InvalidToken", "The provided token is malformed or otherwise invalid."),
                };
                StorageServiceError::Rejected(fault)
            })?;

        Ok(FileObjectStore {
            store: self.store.clone(),
            bucket: self.bucket.clone(),
            credentials,
        })
    }
}

/// A local bucket client bound to one set of storage credentials.
#[derive(Debug)]
pub struct FileObjectStore {
    store: FileStore,
    bucket: String,
    credentials: FederatedCredentials,
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, %key))]
    async fn put_object(&self, key: &ObjectKey, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        self.store
            .put_object(&self.bucket, key.as_str(), content_type, bytes)
            .await
            .map_err(storage_io)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_objects(&self) -> Result<ObjectListing> {
        let mut objects = self
            .store
            .list_objects(&self.bucket)
            .await
            .map_err(storage_io)?;
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        let truncated = objects.len() > LIST_PAGE_SIZE;
        objects.truncate(LIST_PAGE_SIZE);

        let records = objects
            .into_iter()
            .map(|meta| -> Result<ObjectRecord> {
                Ok(ObjectRecord {
                    key: ObjectKey::new(meta.key)?,
                    size: meta.size,
                    last_modified: Some(meta.last_modified),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ObjectListing { records, truncated })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, %key))]
    async fn delete_object(&self, key: &ObjectKey) -> Result<()> {
        self.store
            .delete_object(&self.bucket, key.as_str())
            .await
            .map_err(storage_io)
    }

    /// Signs a `file://` URL to the object's bytes. The query carries the
    /// key, the signing time, the window and an HMAC under the store's
    /// signing key, checked by [`FileStorageProvider::verify_link`].
    #[instrument(skip(self), fields(bucket = %self.bucket, %key))]
    async fn presign_get(&self, key: &ObjectKey, expires_in: Duration) -> Result<Url> {
        let path = self.store.object_path(&self.bucket, key.as_str());
        let mut url = Url::from_file_path(&path).map_err(|()| InvalidInputError::Url {
            value: path.display().to_string(),
            reason: "object path is not absolute".to_string(),
        })?;

        let date = Utc::now().format(LINK_DATE_FORMAT).to_string();
        let expires = expires_in.as_secs().to_string();
        let canonical = link_canonical(
            &self.bucket,
            key.as_str(),
            self.credentials.access_key_id(),
            &date,
            &expires,
        );
        let signer = Signer::new(self.store.signing_key().await.map_err(storage_io)?);
        let signature = signer.sign_bytes(canonical.as_bytes());

        url.query_pairs_mut()
            .append_pair("X-Ferry-Key", key.as_str())
            .append_pair("X-Ferry-Credential", self.credentials.access_key_id())
            .append_pair("X-Ferry-Date", &date)
            .append_pair("X-Ferry-Expires", &expires)
            .append_pair("X-Ferry-Signature", &hex::encode(signature));

        debug!("Signed local download link");
        Ok(url)
    }
}
