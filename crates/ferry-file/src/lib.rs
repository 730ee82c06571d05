//! ferry-file - Filesystem-backed directory, identity pool and bucket.
//!
//! Everything lives under one root directory, which makes this backend
//! suitable for offline development and tests. Tokens, storage
//! credentials and download links are HMAC-signed with a key generated on
//! first use and kept under the root.

mod broker;
mod directory;
mod objects;
mod signing;
mod store;

pub use broker::FileBroker;
pub use directory::FileDirectory;
pub use objects::{FileObjectStore, FileStorageProvider};
pub use store::FileStore;
