//! File-backed identity pool.

use async_trait::async_trait;
use chrono::Duration;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, instrument};

use ferry_core::error::{CredentialExchangeError, ServiceFault};
use ferry_core::{CredentialBroker, FederatedCredentials, LoginSession, Result};

use crate::directory::FileDirectory;
use crate::signing::{Claims, TokenKind};

const CREDENTIAL_TTL: Duration = Duration::hours(1);

/// Exchanges local id tokens for storage credentials.
///
/// The session token of the issued credentials is itself a signed token,
/// which [`FileStorageProvider`](crate::FileStorageProvider) verifies when
/// a client is connected.
#[derive(Debug, Clone)]
pub struct FileBroker {
    directory: FileDirectory,
}

impl FileBroker {
    /// Create a broker that trusts tokens issued by `directory`.
    pub fn new(directory: FileDirectory) -> Self {
        Self { directory }
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl CredentialBroker for FileBroker {
    #[instrument(skip(self, session), fields(user = %session.identity()))]
    async fn exchange(&self, session: &LoginSession) -> Result<FederatedCredentials> {
        let signer = self
            .directory
            .signer()
            .await
            .map_err(|e| CredentialExchangeError::Transport {
                message: format!("IO error: {}", e),
            })?;

        let claims = signer
            .verify(session.id_token().as_str(), TokenKind::Id)
            .map_err(|rejection| {
                debug!(?rejection, "Id token refused");
                CredentialExchangeError::Rejected(ServiceFault::coded(
                    "NotAuthorizedException",
                    "Invalid login token.",
                ))
            })?;

        let storage = Claims::new(TokenKind::Storage, &claims.sub, &claims.username, CREDENTIAL_TTL);
        let expiration = storage.expires_at();

        debug!(%expiration, "Issued local storage credentials");
        Ok(FederatedCredentials::new(
            format!("local:{}", claims.sub),
            format!("LOCAL{}", random_hex(8).to_uppercase()),
            random_hex(20),
            signer.issue(&storage),
            Some(expiration),
        ))
    }
}
