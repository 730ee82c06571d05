//! ferry-aws - Cognito and S3 backend.
//!
//! - [`CognitoDirectory`]: user-pool sign-up, confirmation and SRP sign-in,
//!   with silent refresh of the stored session.
//! - [`CognitoBroker`]: identity-pool exchange of the id token for
//!   temporary credentials.
//! - [`S3Provider`] / [`S3Store`]: one S3 client per operation, bound to
//!   those credentials.
//!
//! The directory and identity-pool calls are unsigned; no ambient AWS
//! credentials are read.

mod broker;
mod directory;
mod error;
mod jwt;
mod s3;
mod sdk;
mod srp;

use std::sync::Arc;

use ferry_core::{Config, Ferry, SessionStore};

pub use broker::CognitoBroker;
pub use directory::CognitoDirectory;
pub use s3::{S3Provider, S3Store};

/// A [`Ferry`] wired to Cognito and S3.
pub type AwsFerry = Ferry<CognitoDirectory, CognitoBroker, S3Provider>;

/// Build the Cognito and S3 backend from `config`, keeping the session in
/// `sessions`.
pub fn connect(config: &Config, sessions: Arc<dyn SessionStore>) -> AwsFerry {
    Ferry::new(
        CognitoDirectory::new(config, sessions),
        CognitoBroker::new(config),
        S3Provider::new(config),
        config.storage.link_expiry,
    )
}
