//! Storage client traits.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::federated::FederatedCredentials;
use crate::types::{ObjectKey, ObjectRecord};
use crate::Result;

/// One page of a bucket listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectListing {
    /// Records in the order the service returned them.
    pub records: Vec<ObjectRecord>,
    /// Whether the service reported more objects than this page holds.
    pub truncated: bool,
}

/// A storage client bound to one set of credentials and one bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the bucket this client is bound to.
    fn bucket(&self) -> &str;

    /// Create or overwrite an object.
    async fn put_object(&self, key: &ObjectKey, content_type: &str, bytes: Vec<u8>) -> Result<()>;

    /// List the bucket in a single request.
    async fn list_objects(&self) -> Result<ObjectListing>;

    /// Delete an object. Deleting a missing key succeeds.
    async fn delete_object(&self, key: &ObjectKey) -> Result<()>;

    /// Sign a GET link for `key`, valid for `expires_in`. Purely local;
    /// the key is not checked for existence.
    async fn presign_get(&self, key: &ObjectKey, expires_in: Duration) -> Result<Url>;
}

/// Builds storage clients from federated credentials.
pub trait StorageProvider: Send + Sync {
    /// Client type produced by this provider.
    type Client: ObjectStore;

    /// Bind a new client to `credentials`.
    fn connect(&self, credentials: FederatedCredentials) -> Result<Self::Client>;
}
