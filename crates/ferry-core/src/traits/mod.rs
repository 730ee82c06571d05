//! Core traits for the directory, identity pool and storage backends.

mod broker;
mod directory;
mod store;

pub use broker::CredentialBroker;
pub use directory::{Directory, SignUpOutput};
pub use store::{ObjectListing, ObjectStore, StorageProvider};
