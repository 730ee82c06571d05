//! Temporary storage credentials derived from a login session.

use std::fmt;

use chrono::{DateTime, Utc};

/// Temporary storage-service credentials scoped to an identity pool.
///
/// Derived fresh for every storage client; never cached or persisted.
#[derive(Clone)]
pub struct FederatedCredentials {
    identity_id: String,
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: Option<DateTime<Utc>>,
}

impl FederatedCredentials {
    /// Create new credentials.
    pub fn new(
        identity_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration,
        }
    }

    /// The identity pool's id for the signed-in user.
    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// # Security
    ///
    /// Use only when signing requests.
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// # Security
    ///
    /// Use only when signing requests.
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Whether the credentials have lapsed at `now`. Credentials without an
    /// expiry never lapse.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|exp| now >= exp)
    }
}

impl fmt::Debug for FederatedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedCredentials")
            .field("identity_id", &self.identity_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .finish()
    }
}
