//! File-backed identity directory.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use ferry_core::error::{AuthenticationError, DirectoryError, ServiceFault};
use ferry_core::traits::{Directory, SignUpOutput};
use ferry_core::{
    AccessToken, Credentials, Error, IdToken, Identity, LoginSession, RefreshToken, Result,
    SessionStore,
};

use crate::signing::{Claims, Signer, TokenKind};
use crate::store::{FileStore, LocalAccount, blocking};

/// Shortest secret the local directory accepts.
const MIN_SECRET_LEN: usize = 8;

const DEFAULT_SESSION_TTL: Duration = Duration::hours(1);
const DEFAULT_REFRESH_TTL: Duration = Duration::days(30);

/// Checked when the account does not exist, so unknown users cost a full
/// bcrypt verification too.
const ABSENT_ACCOUNT_HASH: &str =
    "$2b$12$Fz8CqT3r0VwY1sLkN2mPxeHq5dR7tKj2WbXo9LcV4nZ0sAfU6yGi.";

fn incorrect_credentials() -> Error {
    AuthenticationError::Rejected(ServiceFault::coded(
        "NotAuthorizedException",
        "Incorrect username or password.",
    ))
    .into()
}

/// Filesystem-backed identity directory.
///
/// Accounts live under the store root; the current session lives in the
/// supplied [`SessionStore`].
#[derive(Clone)]
pub struct FileDirectory {
    store: FileStore,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
    refresh_ttl: Duration,
    auto_confirm: bool,
}

impl FileDirectory {
    /// Create a directory rooted at `root` that keeps its session in
    /// `sessions`. Registrations are confirmed automatically.
    pub fn new(root: impl AsRef<Path>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            store: FileStore::new(root),
            sessions,
            session_ttl: DEFAULT_SESSION_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            auto_confirm: true,
        }
    }

    /// Lifetime of id and access tokens.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Lifetime of refresh tokens.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Whether registrations are confirmed without a code.
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    /// Returns the underlying file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// The code a pending registration must be confirmed with. Stands in for
    /// the email a hosted directory would send.
    pub async fn pending_confirmation_code(&self, username: &str) -> Result<Option<String>> {
        let account = self.store.get_account(username).await.map_err(directory_io)?;
        Ok(account.and_then(|a| a.confirmation_code))
    }

    pub(crate) async fn signer(&self) -> io::Result<Signer> {
        self.store.signing_key().await.map(Signer::new)
    }

    fn issue_session(
        &self,
        signer: &Signer,
        sub: &str,
        username: &str,
        refresh_token: Option<RefreshToken>,
    ) -> LoginSession {
        let id_claims = Claims::new(TokenKind::Id, sub, username, self.session_ttl);
        let access_claims = Claims::new(TokenKind::Access, sub, username, self.session_ttl);
        let refresh_token = refresh_token.unwrap_or_else(|| {
            RefreshToken::new(signer.issue(&Claims::new(
                TokenKind::Refresh,
                sub,
                username,
                self.refresh_ttl,
            )))
        });

        LoginSession::new(
            Identity::new(username, sub),
            IdToken::new(signer.issue(&id_claims)),
            AccessToken::new(signer.issue(&access_claims)),
            Some(refresh_token),
            id_claims.expires_at(),
        )
    }

    /// Renew `session` with its refresh token, if that token still verifies.
    fn renew(&self, signer: &Signer, session: &LoginSession) -> Option<LoginSession> {
        let refresh = session.refresh_token()?;
        match signer.verify(refresh.as_str(), TokenKind::Refresh) {
            Ok(claims) => Some(self.issue_session(
                signer,
                &claims.sub,
                &claims.username,
                Some(refresh.clone()),
            )),
            Err(rejection) => {
                debug!(?rejection, "Refresh token refused");
                None
            }
        }
    }
}

fn directory_io(err: io::Error) -> Error {
    DirectoryError::Transport {
        message: format!("IO error: {}", err),
    }
    .into()
}

fn auth_io(err: io::Error) -> Error {
    AuthenticationError::Transport {
        message: format!("IO error: {}", err),
    }
    .into()
}

/// bcrypt is CPU-bound for about a second at the default cost.
async fn hash_secret(secret: String) -> io::Result<String> {
    blocking(move || hash(secret, DEFAULT_COST).map_err(io::Error::other)).await
}

async fn verify_secret(secret: String, password_hash: String) -> io::Result<bool> {
    blocking(move || verify(secret, &password_hash).map_err(io::Error::other)).await
}

#[async_trait]
impl Directory for FileDirectory {
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutput> {
        if credentials.secret().chars().count() < MIN_SECRET_LEN {
            return Err(DirectoryError::Rejected(ServiceFault::coded(
                "InvalidPasswordException",
                format!("Password must have at least {} characters", MIN_SECRET_LEN),
            ))
            .into());
        }

        let password_hash = hash_secret(credentials.secret().to_string())
            .await
            .map_err(directory_io)?;

        let confirmation_code =
            (!self.auto_confirm).then(|| format!("{:06}", rand::thread_rng().gen_range(0..1_000_000)));

        let account = LocalAccount {
            username: credentials.identifier().to_string(),
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            password_hash,
            confirmed: self.auto_confirm,
            confirmation_code,
        };

        let user_id = account.id.clone();
        let confirmed = account.confirmed;

        self.store.create_account(account).await.map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                DirectoryError::Rejected(ServiceFault::coded(
                    "UsernameExistsException",
                    "User already exists",
                ))
                .into()
            } else {
                directory_io(e)
            }
        })?;

        info!(%user_id, confirmed, "Registered local account");

        Ok(SignUpOutput { user_id, confirmed })
    }

    #[instrument(skip(self, code))]
    async fn confirm_sign_up(&self, identifier: &str, code: &str) -> Result<()> {
        let mut account = self
            .store
            .get_account(identifier)
            .await
            .map_err(directory_io)?
            .ok_or_else(|| {
                DirectoryError::Rejected(ServiceFault::coded(
                    "UserNotFoundException",
                    "Username/client id combination not found.",
                ))
            })?;

        if account.confirmed {
            return Err(DirectoryError::Rejected(ServiceFault::coded(
                "NotAuthorizedException",
                "User cannot be confirmed. Current status is CONFIRMED",
            ))
            .into());
        }

        if account.confirmation_code.as_deref() != Some(code) {
            return Err(DirectoryError::Rejected(ServiceFault::coded(
                "CodeMismatchException",
                "Invalid verification code provided, please try again.",
            ))
            .into());
        }

        account.confirmed = true;
        account.confirmation_code = None;
        self.store.update_account(account).await.map_err(directory_io)?;

        debug!("Confirmed local account");
        Ok(())
    }

    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    async fn sign_in(&self, credentials: Credentials) -> Result<LoginSession> {
        let account = self
            .store
            .get_account(credentials.identifier())
            .await
            .map_err(auth_io)?;

        let password_hash = account
            .as_ref()
            .map_or(ABSENT_ACCOUNT_HASH, |a| a.password_hash.as_str())
            .to_string();
        let matched = verify_secret(credentials.secret().to_string(), password_hash)
            .await
            .map_err(auth_io)?;

        let account = match account {
            Some(account) if matched => account,
            _ => return Err(incorrect_credentials()),
        };

        if !account.confirmed {
            return Err(AuthenticationError::Rejected(ServiceFault::coded(
                "UserNotConfirmedException",
                "User is not confirmed.",
            ))
            .into());
        }

        let signer = self.signer().await.map_err(auth_io)?;
        let session = self.issue_session(&signer, &account.id, &account.username, None);
        self.sessions.save(&session).await?;

        debug!(expires_at = %session.expires_at(), "Issued local session");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn current_session(&self) -> Option<LoginSession> {
        let stored = match self.sessions.load().await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to load session");
                return None;
            }
        };

        let signer = match self.signer().await {
            Ok(signer) => signer,
            Err(e) => {
                warn!(error = %e, "Failed to load signing key");
                return None;
            }
        };

        if stored.is_valid() {
            return match signer.verify(stored.id_token().as_str(), TokenKind::Id) {
                Ok(_) => Some(stored),
                Err(rejection) => {
                    warn!(?rejection, "Stored session failed verification");
                    None
                }
            };
        }

        debug!("Session expired, attempting renewal");
        let renewed = self.renew(&signer, &stored)?;
        if !renewed.is_valid() {
            return None;
        }

        if let Err(e) = self.sessions.save(&renewed).await {
            warn!(error = %e, "Failed to store renewed session");
        }
        Some(renewed)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) {
        if let Err(e) = self.sessions.clear().await {
            warn!(error = %e, "Failed to clear session");
        }
    }
}

impl std::fmt::Debug for FileDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDirectory")
            .field("store", &self.store)
            .field("session_ttl", &self.session_ttl)
            .field("auto_confirm", &self.auto_confirm)
            .finish()
    }
}
