//! Directory principal type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A principal registered with the identity directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Username (or email, when the directory signs users in by email).
    pub username: String,
    /// Opaque directory-assigned id.
    pub id: String,
    /// Email address, when the directory reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    /// Create a new identity.
    pub fn new(username: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            id: id.into(),
            email: None,
        }
    }

    /// Attach an email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}
