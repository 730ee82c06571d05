//! In-memory backends for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use url::Url;

use crate::error::{AuthenticationError, CredentialExchangeError, DirectoryError, ServiceFault};
use crate::session::{LoginSession, MemorySessionStore, SessionStore};
use crate::tokens::{AccessToken, IdToken, RefreshToken};
use crate::traits::{
    CredentialBroker, Directory, ObjectListing, ObjectStore, SignUpOutput, StorageProvider,
};
use crate::types::{Identity, ObjectKey, ObjectRecord};
use crate::{Credentials, FederatedCredentials, Result};

/// Directory that auto-confirms registrations and issues sessions with a
/// fixed lifetime.
pub struct FakeDirectory {
    accounts: Mutex<HashMap<String, String>>,
    sessions: MemorySessionStore,
    ttl: chrono::Duration,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::with_ttl(chrono::Duration::hours(1))
    }

    pub fn with_ttl(ttl: chrono::Duration) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            sessions: MemorySessionStore::new(),
            ttl,
        }
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutput> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(credentials.identifier()) {
            return Err(DirectoryError::Rejected(ServiceFault::coded(
                "UsernameExistsException",
                "User already exists",
            ))
            .into());
        }
        accounts.insert(
            credentials.identifier().to_string(),
            credentials.secret().to_string(),
        );
        Ok(SignUpOutput {
            user_id: format!("sub-{}", credentials.identifier()),
            confirmed: true,
        })
    }

    async fn confirm_sign_up(&self, _identifier: &str, _code: &str) -> Result<()> {
        Ok(())
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<LoginSession> {
        let known = self
            .accounts
            .lock()
            .unwrap()
            .get(credentials.identifier())
            .is_some_and(|secret| secret == credentials.secret());
        if !known {
            return Err(AuthenticationError::Rejected(ServiceFault::coded(
                "NotAuthorizedException",
                "Incorrect username or password.",
            ))
            .into());
        }

        let identity = Identity::new(
            credentials.identifier(),
            format!("sub-{}", credentials.identifier()),
        );
        let session = LoginSession::new(
            identity,
            IdToken::new("id"),
            AccessToken::new("access"),
            Some(RefreshToken::new("refresh")),
            Utc::now() + self.ttl,
        );
        self.sessions.save(&session).await?;
        Ok(session)
    }

    async fn current_session(&self) -> Option<LoginSession> {
        self.sessions
            .load()
            .await
            .ok()
            .flatten()
            .filter(LoginSession::is_valid)
    }

    async fn sign_out(&self) {
        let _ = self.sessions.clear().await;
    }
}

/// Broker that counts exchanges and optionally rejects them.
#[derive(Clone)]
pub struct CountingBroker {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingBroker {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialBroker for CountingBroker {
    async fn exchange(&self, session: &LoginSession) -> Result<FederatedCredentials> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CredentialExchangeError::Rejected(ServiceFault::coded(
                "NotAuthorizedException",
                "Invalid login token.",
            ))
            .into());
        }
        Ok(FederatedCredentials::new(
            format!("pool:{}", session.identity().id),
            "ASIATEST",
            "secret",
            "token",
            None,
        ))
    }
}

#[derive(Clone)]
struct StoredObject {
    key: ObjectKey,
    content_type: String,
    size: u64,
}

/// Provider whose clients share one in-memory bucket.
#[derive(Clone)]
pub struct MemoryProvider {
    objects: Arc<Mutex<Vec<StoredObject>>>,
    connects: Arc<AtomicUsize>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn content_type(&self, key: &ObjectKey) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| &o.key == key)
            .map(|o| o.content_type.clone())
    }
}

impl StorageProvider for MemoryProvider {
    type Client = MemoryStore;

    fn connect(&self, _credentials: FederatedCredentials) -> Result<MemoryStore> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryStore {
            objects: Arc::clone(&self.objects),
        })
    }
}

pub struct MemoryStore {
    objects: Arc<Mutex<Vec<StoredObject>>>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        "test-bucket"
    }

    async fn put_object(&self, key: &ObjectKey, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        objects.retain(|o| &o.key != key);
        objects.push(StoredObject {
            key: key.clone(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
        });
        Ok(())
    }

    async fn list_objects(&self) -> Result<ObjectListing> {
        let records = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|o| ObjectRecord {
                key: o.key.clone(),
                size: o.size,
                last_modified: None,
            })
            .collect();
        Ok(ObjectListing {
            records,
            truncated: false,
        })
    }

    async fn delete_object(&self, key: &ObjectKey) -> Result<()> {
        self.objects.lock().unwrap().retain(|o| &o.key != key);
        Ok(())
    }

    async fn presign_get(&self, key: &ObjectKey, expires_in: Duration) -> Result<Url> {
        let mut url = Url::parse("memory://test-bucket/").unwrap();
        url.path_segments_mut()
            .unwrap()
            .pop_if_empty()
            .push(key.as_str());
        url.query_pairs_mut()
            .append_pair("expires", &expires_in.as_secs().to_string());
        Ok(url)
    }
}
