//! Core ferry types.
//!
//! These types enforce their invariants at construction time.

mod identity;
mod object;
mod object_key;

pub use identity::Identity;
pub use object::{DEFAULT_CONTENT_TYPE, ObjectRecord, UploadFile};
pub use object_key::ObjectKey;
