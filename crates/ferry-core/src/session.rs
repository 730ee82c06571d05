//! Login sessions and the directory client's session storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::tokens::{AccessToken, IdToken, RefreshToken};
use crate::types::Identity;
use crate::Result;

/// The proof of a completed sign-in.
///
/// A session is valid strictly before `expires_at`. Renewal with the
/// refresh token is the directory client's business and yields a new
/// `LoginSession` for the same identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    identity: Identity,
    id_token: IdToken,
    access_token: AccessToken,
    refresh_token: Option<RefreshToken>,
    expires_at: DateTime<Utc>,
}

impl LoginSession {
    /// Create a new session.
    pub fn new(
        identity: Identity,
        id_token: IdToken,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            id_token,
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Returns the signed-in identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the id token presented to the identity pool.
    pub fn id_token(&self) -> &IdToken {
        &self.id_token
    }

    /// Returns the access token.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the refresh token, if the directory issued one.
    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// Returns the instant the session stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the session is valid right now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether the session is valid at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Convert into the plain form written by session stores.
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            username: self.identity.username.clone(),
            id: self.identity.id.clone(),
            email: self.identity.email.clone(),
            id_token: self.id_token.as_str().to_string(),
            access_token: self.access_token.as_str().to_string(),
            refresh_token: self.refresh_token.as_ref().map(|t| t.as_str().to_string()),
            expires_at: self.expires_at,
        }
    }
}

/// Plain session data as written by session stores.
#[derive(Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub username: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub id_token: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<PersistedSession> for LoginSession {
    fn from(stored: PersistedSession) -> Self {
        let mut identity = Identity::new(stored.username, stored.id);
        identity.email = stored.email;
        LoginSession::new(
            identity,
            IdToken::new(stored.id_token),
            AccessToken::new(stored.access_token),
            stored.refresh_token.map(RefreshToken::new),
            stored.expires_at,
        )
    }
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("username", &self.username)
            .field("id", &self.id)
            .field("tokens", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Storage the directory client keeps its current session in.
///
/// There is one store per process; the gateway and the session resolver
/// both reach it through the directory.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, if any. Expired sessions are returned as-is.
    async fn load(&self) -> Result<Option<LoginSession>>;

    /// Replace the stored session.
    async fn save(&self, session: &LoginSession) -> Result<()>;

    /// Remove the stored session. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<()>;
}

/// Process-local session store.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<Option<LoginSession>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<LoginSession>> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, session: &LoginSession) -> Result<()> {
        *self.inner.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.write().await.take();
        Ok(())
    }
}
