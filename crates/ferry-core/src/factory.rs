//! Storage client factory.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::resolver::SessionResolver;
use crate::traits::{CredentialBroker, StorageProvider};
use crate::{Error, Result};

/// Builds a fresh storage client for each logical operation.
///
/// Session, credentials and client are derived anew on every call; nothing
/// is cached between calls.
pub struct ClientFactory<R: ?Sized, B, P> {
    resolver: Arc<R>,
    broker: B,
    provider: P,
}

impl<R, B, P> ClientFactory<R, B, P>
where
    R: SessionResolver + ?Sized,
    B: CredentialBroker,
    P: StorageProvider,
{
    /// Create a new factory.
    pub fn new(resolver: Arc<R>, broker: B, provider: P) -> Self {
        Self {
            resolver,
            broker,
            provider,
        }
    }

    /// Resolve the session, exchange it, and bind a client to the result.
    ///
    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] when there is no valid session (no
    /// exchange is attempted); otherwise whatever the broker or provider
    /// reports. A half-built client is never returned.
    #[instrument(skip(self))]
    pub async fn get_client(&self) -> Result<P::Client> {
        let session = self.resolver.resolve().await.ok_or(Error::NotAuthenticated)?;

        debug!(user = %session.identity(), "Exchanging session for storage credentials");
        let credentials = self.broker.exchange(&session).await?;

        debug!(identity_id = %credentials.identity_id(), "Binding storage client");
        self.provider.connect(credentials)
    }
}
