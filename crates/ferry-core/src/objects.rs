//! Object operations: upload, list, delete and download links.
//!
//! Each operation acquires a fresh client through the [`ClientFactory`],
//! issues exactly one storage request and maps the result. Nothing is
//! retried.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::factory::ClientFactory;
use crate::resolver::SessionResolver;
use crate::traits::{CredentialBroker, ObjectStore, StorageProvider};
use crate::types::{ObjectKey, ObjectRecord, UploadFile};
use crate::Result;

/// Upload, list, delete and link objects in the configured bucket.
pub struct ObjectOperations<R: ?Sized, B, P> {
    factory: ClientFactory<R, B, P>,
    link_expiry: Duration,
}

impl<R, B, P> ObjectOperations<R, B, P>
where
    R: SessionResolver + ?Sized,
    B: CredentialBroker,
    P: StorageProvider,
{
    /// Create object operations over `factory`, signing links for
    /// `link_expiry`.
    pub fn new(factory: ClientFactory<R, B, P>, link_expiry: Duration) -> Self {
        Self {
            factory,
            link_expiry,
        }
    }

    /// Returns the lifetime of signed download links.
    pub fn link_expiry(&self) -> Duration {
        self.link_expiry
    }

    /// Upload `file` under `"{unix_millis}-{name}"` and return the key.
    ///
    /// Two uploads of the same name within one millisecond share a key and
    /// the later one wins.
    #[instrument(skip(self, file), fields(name = %file.name, size = file.bytes.len()))]
    pub async fn upload(&self, file: UploadFile) -> Result<ObjectKey> {
        let client = self.factory.get_client().await?;
        let key = ObjectKey::for_upload(Utc::now().timestamp_millis(), &file.name)?;

        info!(%key, bucket = client.bucket(), "Uploading object");
        client
            .put_object(&key, &file.content_type, file.bytes)
            .await?;

        Ok(key)
    }

    /// List the bucket in one request.
    ///
    /// Records come back in service order. Buckets larger than one page
    /// are truncated.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ObjectRecord>> {
        let client = self.factory.get_client().await?;
        let listing = client.list_objects().await?;

        if listing.truncated {
            warn!(
                returned = listing.records.len(),
                bucket = client.bucket(),
                "Listing truncated; only the first page is returned"
            );
        }

        debug!(count = listing.records.len(), "Listed objects");
        Ok(listing.records)
    }

    /// Delete `key`. A missing key is not an error.
    #[instrument(skip(self), fields(%key))]
    pub async fn delete(&self, key: &ObjectKey) -> Result<()> {
        let client = self.factory.get_client().await?;
        info!(bucket = client.bucket(), "Deleting object");
        client.delete_object(key).await
    }

    /// Sign a time-limited download link for `key` without checking that
    /// it exists.
    #[instrument(skip(self), fields(%key))]
    pub async fn download_link(&self, key: &ObjectKey) -> Result<Url> {
        let client = self.factory.get_client().await?;
        let url = client.presign_get(key, self.link_expiry).await?;
        debug!(expires_in = self.link_expiry.as_secs(), "Signed download link");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingBroker, FakeDirectory, MemoryProvider};
    use crate::traits::Directory;
    use crate::{Credentials, Error};
    use std::sync::Arc;

    async fn signed_in() -> (ObjectOperations<FakeDirectory, CountingBroker, MemoryProvider>, MemoryProvider) {
        let directory = Arc::new(FakeDirectory::new());
        directory.sign_up(Credentials::new("alice", "pw")).await.unwrap();
        directory.sign_in(Credentials::new("alice", "pw")).await.unwrap();
        let provider = MemoryProvider::new();
        let factory = ClientFactory::new(directory, CountingBroker::new(), provider.clone());
        (ObjectOperations::new(factory, Duration::from_secs(3600)), provider)
    }

    #[tokio::test]
    async fn upload_then_list_contains_key() {
        let (ops, _) = signed_in().await;
        let key = ops
            .upload(UploadFile::new("hello.txt", "text/plain", b"hello".to_vec()))
            .await
            .unwrap();

        assert!(key.as_str().ends_with("-hello.txt"));
        let records = ops.list().await.unwrap();
        let record = records.iter().find(|r| r.key == key).unwrap();
        assert_eq!(record.size, 5);
    }

    #[tokio::test]
    async fn upload_sets_declared_content_type() {
        let (ops, provider) = signed_in().await;
        let key = ops
            .upload(UploadFile::new("pic.png", "image/png", vec![0; 8]))
            .await
            .unwrap();
        assert_eq!(provider.content_type(&key).as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn delete_missing_key_succeeds() {
        let (ops, _) = signed_in().await;
        ops.delete(&ObjectKey::new("never-uploaded").unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn link_for_missing_key_is_signed() {
        let (ops, _) = signed_in().await;
        let url = ops
            .download_link(&ObjectKey::new("never-uploaded").unwrap())
            .await
            .unwrap();
        assert!(url.query().unwrap_or("").contains("expires=3600"));
    }

    #[tokio::test]
    async fn operations_fail_closed_without_session() {
        let broker = CountingBroker::new();
        let provider = MemoryProvider::new();
        let factory = ClientFactory::new(
            Arc::new(FakeDirectory::new()),
            broker.clone(),
            provider.clone(),
        );
        let ops = ObjectOperations::new(factory, Duration::from_secs(3600));
        let key = ObjectKey::new("k").unwrap();

        let results = [
            ops.upload(UploadFile::new("a", "text/plain", vec![]))
                .await
                .map(|_| ()),
            ops.list().await.map(|_| ()),
            ops.delete(&key).await,
            ops.download_link(&key).await.map(|_| ()),
        ];

        for result in results {
            assert!(matches!(result, Err(Error::NotAuthenticated)));
        }
        assert_eq!(broker.calls(), 0);
        assert_eq!(provider.connects(), 0);
    }
}
