//! Object key type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum key length accepted by the storage service, in UTF-8 bytes.
const MAX_KEY_BYTES: usize = 1024;

/// A validated object key, unique within the bucket.
///
/// # Example
///
/// ```
/// use ferry_core::ObjectKey;
///
/// let key = ObjectKey::new("1700000000000-report.pdf").unwrap();
/// assert_eq!(key.as_str(), "1700000000000-report.pdf");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new key from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or longer than 1024 bytes.
    /// Any other UTF-8, control characters included, is a valid key.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Build the key an upload of `name` receives at `unix_millis`.
    ///
    /// Two uploads of the same name in the same millisecond get the same
    /// key; the second overwrites the first.
    pub fn for_upload(unix_millis: i64, name: &str) -> Result<Self, Error> {
        Self::new(format!("{}-{}", unix_millis, name))
    }

    /// Returns the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::ObjectKey {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.len() > MAX_KEY_BYTES {
            return Err(InvalidInputError::ObjectKey {
                value: s.to_string(),
                reason: format!("exceeds maximum length of {} bytes", MAX_KEY_BYTES),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_key_with_slashes() {
        let key = ObjectKey::new("photos/2024/cat.png").unwrap();
        assert_eq!(key.as_str(), "photos/2024/cat.png");
    }

    #[test]
    fn upload_key_prefixes_timestamp() {
        let key = ObjectKey::for_upload(1_700_000_000_123, "notes.txt").unwrap();
        assert_eq!(key.as_str(), "1700000000123-notes.txt");
    }

    #[test]
    fn distinct_timestamps_give_distinct_keys() {
        let a = ObjectKey::for_upload(1, "same.txt").unwrap();
        let b = ObjectKey::for_upload(2, "same.txt").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn same_millisecond_same_name_collides() {
        let a = ObjectKey::for_upload(42, "same.txt").unwrap();
        let b = ObjectKey::for_upload(42, "same.txt").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_empty() {
        assert!(ObjectKey::new("").is_err());
    }

    #[test]
    fn invalid_too_long() {
        assert!(ObjectKey::new("a".repeat(1025)).is_err());
        assert!(ObjectKey::new("a".repeat(1024)).is_ok());
    }

    #[test]
    fn control_characters_are_valid() {
        let key = ObjectKey::new("2-tab\tname.txt").unwrap();
        assert_eq!(key.as_str(), "2-tab\tname.txt");
    }
}
