//! Credential broker trait.

use async_trait::async_trait;

use crate::federated::FederatedCredentials;
use crate::session::LoginSession;
use crate::Result;

/// Exchanges a login session for temporary storage credentials.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Present the session's id token to the identity pool.
    ///
    /// The caller has already checked the session is valid; the broker
    /// does not check again. Every call performs a fresh exchange.
    async fn exchange(&self, session: &LoginSession) -> Result<FederatedCredentials>;
}
