//! Sign-in credentials.

use std::fmt;

/// Identifier and secret for sign-up or sign-in.
///
/// Nothing is validated here; the directory's password policy is the only
/// judge. The secret is redacted from `Debug`.
///
/// ```
/// use ferry_core::Credentials;
///
/// let creds = Credentials::new("alice@example.com", "correct horse");
/// assert_eq!(creds.identifier(), "alice@example.com");
/// ```
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Username or email address.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Plaintext secret. Only SRP and the local hasher read it.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
