//! Identity directory trait.

use async_trait::async_trait;

use crate::session::LoginSession;
use crate::{Credentials, Result};

/// Output from registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutput {
    /// The directory-assigned id of the new identity.
    pub user_id: String,
    /// Whether the registration is already confirmed.
    pub confirmed: bool,
}

/// An identity directory client.
///
/// Implementations own the process's session storage: `sign_in` writes it,
/// `sign_out` clears it and `current_session` reads (and may renew) it.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Register a new identity.
    async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutput>;

    /// Confirm a pending registration with the code the directory sent.
    async fn confirm_sign_up(&self, identifier: &str, code: &str) -> Result<()>;

    /// Authenticate and store the resulting session.
    async fn sign_in(&self, credentials: Credentials) -> Result<LoginSession>;

    /// The stored session if it is still valid, renewing it silently when
    /// possible. Absence, expiry and failed renewal all yield `None`.
    async fn current_session(&self) -> Option<LoginSession>;

    /// Forget the stored session. Idempotent.
    async fn sign_out(&self);
}
