//! Object listing and upload types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ObjectKey;

/// Content type used when an upload declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One stored object, as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// The object's key.
    pub key: ObjectKey,
    /// Size in bytes.
    pub size: u64,
    /// When the object was last written, if the service reported it.
    pub last_modified: Option<DateTime<Utc>>,
}

/// A file to upload.
#[derive(Clone)]
pub struct UploadFile {
    /// Original file name; becomes the suffix of the object key.
    pub name: String,
    /// Declared content type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create a new upload. An empty content type falls back to
    /// `application/octet-stream`.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let content_type = content_type.into();
        Self {
            name: name.into(),
            content_type: if content_type.is_empty() {
                DEFAULT_CONTENT_TYPE.to_string()
            } else {
                content_type
            },
            bytes,
        }
    }
}

// Contents can be large; show only their length.
impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_type_falls_back() {
        let file = UploadFile::new("a.bin", "", vec![1, 2, 3]);
        assert_eq!(file.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn debug_omits_contents() {
        let file = UploadFile::new("a.txt", "text/plain", b"hello".to_vec());
        let debug = format!("{:?}", file);
        assert!(debug.contains("len: 5"));
        assert!(!debug.contains("104"));
    }
}
