//! Authentication gateway.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::session::LoginSession;
use crate::traits::{Directory, SignUpOutput};
use crate::types::Identity;
use crate::{Credentials, Result};

/// Where the gateway's session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been established.
    Unauthenticated,
    /// A sign-in exchange is in flight.
    PendingChallenge,
    /// A valid session exists.
    Authenticated,
    /// The session lapsed and could not be renewed.
    Expired,
    /// The user signed out.
    SignedOut,
}

/// Sign-up, sign-in and sign-out against an identity directory.
pub struct AuthGateway<D: ?Sized> {
    directory: Arc<D>,
    state: Mutex<SessionState>,
}

impl<D> AuthGateway<D>
where
    D: Directory + ?Sized,
{
    /// Create a gateway over a shared directory client.
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            state: Mutex::new(SessionState::Unauthenticated),
        }
    }

    /// Returns the shared directory client.
    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            debug!(from = ?*state, to = ?next, "Session state changed");
            *state = next;
        }
    }

    /// Register a new identity.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutput> {
        info!("Registering identity");
        let output = self.directory.sign_up(credentials).await?;
        debug!(user_id = %output.user_id, confirmed = output.confirmed, "Registered");
        Ok(output)
    }

    /// Confirm a pending registration.
    #[instrument(skip(self, code))]
    pub async fn confirm_sign_up(&self, identifier: &str, code: &str) -> Result<()> {
        info!("Confirming registration");
        self.directory.confirm_sign_up(identifier, code).await
    }

    /// Authenticate and establish a session.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn sign_in(&self, credentials: Credentials) -> Result<LoginSession> {
        info!("Signing in");
        let previous = self.state();
        self.set_state(SessionState::PendingChallenge);

        match self.directory.sign_in(credentials).await {
            Ok(session) => {
                self.set_state(SessionState::Authenticated);
                debug!(user = %session.identity(), expires_at = %session.expires_at(), "Signed in");
                Ok(session)
            }
            Err(e) => {
                // A failed attempt leaves any stored session untouched.
                self.set_state(previous);
                warn!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    /// The identity of the current valid session, or `None`.
    #[instrument(skip(self))]
    pub async fn current_session(&self) -> Option<Identity> {
        match self.directory.current_session().await {
            Some(session) => {
                self.set_state(SessionState::Authenticated);
                Some(session.identity().clone())
            }
            None => {
                if self.state() == SessionState::Authenticated {
                    self.set_state(SessionState::Expired);
                }
                None
            }
        }
    }

    /// Sign out. Calling this without a session does nothing.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        info!("Signing out");
        self.directory.sign_out().await;
        if self.state() != SessionState::Unauthenticated {
            self.set_state(SessionState::SignedOut);
        }
    }
}
