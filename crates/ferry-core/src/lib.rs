//! ferry-core - Session-scoped storage access for directory-authenticated users.
//!
//! A user signs in against an identity directory; the resulting login
//! session is exchanged with an identity pool for temporary storage
//! credentials; those credentials back a short-lived storage client that
//! performs exactly one object operation.
//!
//! This crate holds the types, error taxonomy, configuration and traits,
//! plus the backend-agnostic gateway, factory and object operations. The
//! `ferry-aws` and `ferry-file` crates provide backends.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod federated;
pub mod gateway;
pub mod objects;
pub mod resolver;
pub mod session;
pub mod tokens;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::Ferry;
pub use config::{Config, StorageSettings};
pub use credentials::Credentials;
pub use error::Error;
pub use factory::ClientFactory;
pub use federated::FederatedCredentials;
pub use gateway::{AuthGateway, SessionState};
pub use objects::ObjectOperations;
pub use resolver::SessionResolver;
pub use session::{LoginSession, MemorySessionStore, PersistedSession, SessionStore};
pub use tokens::{AccessToken, IdToken, RefreshToken};
pub use traits::{
    CredentialBroker, Directory, ObjectListing, ObjectStore, SignUpOutput, StorageProvider,
};
pub use types::{Identity, ObjectKey, ObjectRecord, UploadFile};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
