//! The `Ferry` facade: everything a front end calls.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::factory::ClientFactory;
use crate::gateway::{AuthGateway, SessionState};
use crate::objects::ObjectOperations;
use crate::session::LoginSession;
use crate::traits::{CredentialBroker, Directory, SignUpOutput, StorageProvider};
use crate::types::{Identity, ObjectKey, ObjectRecord, UploadFile};
use crate::{Credentials, Result};

/// Authentication and object operations over one directory, identity pool
/// and bucket.
///
/// The directory client is shared between the gateway (which signs in and
/// out) and the storage client factory (which resolves the session).
///
/// # Example
///
/// ```no_run
/// # use ferry_core::{Credentials, Ferry, UploadFile};
/// # use ferry_core::traits::{CredentialBroker, Directory, StorageProvider};
/// # async fn example<D, B, P>(ferry: Ferry<D, B, P>) -> ferry_core::Result<()>
/// # where D: Directory, B: CredentialBroker, P: StorageProvider {
/// ferry.sign_in(Credentials::new("alice@example.com", "secret")).await?;
/// let key = ferry
///     .upload(UploadFile::new("notes.txt", "text/plain", b"hi".to_vec()))
///     .await?;
/// let link = ferry.download_link(&key).await?;
/// println!("{}", link);
/// # Ok(())
/// # }
/// ```
pub struct Ferry<D, B, P> {
    gateway: AuthGateway<D>,
    objects: ObjectOperations<D, B, P>,
}

impl<D, B, P> Ferry<D, B, P>
where
    D: Directory,
    B: CredentialBroker,
    P: StorageProvider,
{
    /// Wire a directory, broker and storage provider together.
    pub fn new(directory: D, broker: B, provider: P, link_expiry: Duration) -> Self {
        let directory = Arc::new(directory);
        let factory = ClientFactory::new(Arc::clone(&directory), broker, provider);
        Self {
            gateway: AuthGateway::new(directory),
            objects: ObjectOperations::new(factory, link_expiry),
        }
    }

    /// Returns the authentication gateway.
    pub fn gateway(&self) -> &AuthGateway<D> {
        &self.gateway
    }

    /// Returns the object operations.
    pub fn objects(&self) -> &ObjectOperations<D, B, P> {
        &self.objects
    }

    pub async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutput> {
        self.gateway.sign_up(credentials).await
    }

    pub async fn confirm_sign_up(&self, identifier: &str, code: &str) -> Result<()> {
        self.gateway.confirm_sign_up(identifier, code).await
    }

    pub async fn sign_in(&self, credentials: Credentials) -> Result<LoginSession> {
        self.gateway.sign_in(credentials).await
    }

    pub async fn current_session(&self) -> Option<Identity> {
        self.gateway.current_session().await
    }

    pub async fn sign_out(&self) {
        self.gateway.sign_out().await
    }

    pub fn state(&self) -> SessionState {
        self.gateway.state()
    }

    pub async fn upload(&self, file: UploadFile) -> Result<ObjectKey> {
        self.objects.upload(file).await
    }

    pub async fn list(&self) -> Result<Vec<ObjectRecord>> {
        self.objects.list().await
    }

    pub async fn delete(&self, key: &ObjectKey) -> Result<()> {
        self.objects.delete(key).await
    }

    pub async fn download_link(&self, key: &ObjectKey) -> Result<Url> {
        self.objects.download_link(key).await
    }
}
