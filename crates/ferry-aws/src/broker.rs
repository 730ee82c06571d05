//! Cognito identity-pool credential broker.

use async_trait::async_trait;
use aws_sdk_cognitoidentity::Client;
use chrono::DateTime;
use tracing::{debug, instrument};

use ferry_core::error::CredentialExchangeError;
use ferry_core::{Config, CredentialBroker, FederatedCredentials, LoginSession, Result};

use crate::error::exchange_error;
use crate::sdk::sdk_config;

fn missing(field: &'static str) -> ferry_core::Error {
    CredentialExchangeError::MissingField { field }.into()
}

/// Exchanges user-pool id tokens for temporary storage credentials
/// (`GetId` then `GetCredentialsForIdentity`).
#[derive(Clone)]
pub struct CognitoBroker {
    client: Client,
    identity_pool_id: String,
    login_provider: String,
}

impl CognitoBroker {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(&sdk_config(config)),
            identity_pool_id: config.identity_pool_id.clone(),
            login_provider: config.login_provider(),
        }
    }
}

#[async_trait]
impl CredentialBroker for CognitoBroker {
    #[instrument(skip(self, session), fields(user = %session.identity()))]
    async fn exchange(&self, session: &LoginSession) -> Result<FederatedCredentials> {
        let id_token = session.id_token().as_str();

        let identity = self
            .client
            .get_id()
            .identity_pool_id(&self.identity_pool_id)
            .logins(&self.login_provider, id_token)
            .send()
            .await
            .map_err(exchange_error)?;
        let identity_id = identity.identity_id().ok_or_else(|| missing("IdentityId"))?;

        let output = self
            .client
            .get_credentials_for_identity()
            .identity_id(identity_id)
            .logins(&self.login_provider, id_token)
            .send()
            .await
            .map_err(exchange_error)?;
        let credentials = output.credentials().ok_or_else(|| missing("Credentials"))?;

        let expiration = credentials
            .expiration()
            .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()));

        debug!(identity_id, ?expiration, "Exchanged session for credentials");
        Ok(FederatedCredentials::new(
            identity_id,
            credentials
                .access_key_id()
                .ok_or_else(|| missing("AccessKeyId"))?,
            credentials.secret_key().ok_or_else(|| missing("SecretKey"))?,
            credentials
                .session_token()
                .ok_or_else(|| missing("SessionToken"))?,
            expiration,
        ))
    }
}

impl std::fmt::Debug for CognitoBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitoBroker")
            .field("identity_pool_id", &self.identity_pool_id)
            .field("login_provider", &self.login_provider)
            .finish()
    }
}
