//! Session token types.
//!
//! Tokens are opaque to the core. They are never logged and never shown in
//! Debug output.

use std::fmt;

macro_rules! secret_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw token value.
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// Raw value, for requests and the session file only.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }
    };
}

secret_token! {
    /// Identity token presented to the identity pool during credential exchange.
    IdToken
}

secret_token! {
    /// Access token for calls made on behalf of the signed-in user.
    AccessToken
}

secret_token! {
    /// Longer-lived token used to renew the session without the secret.
    RefreshToken
}
