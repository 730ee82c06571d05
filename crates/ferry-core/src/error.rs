//! Error types for ferry operations.
//!
//! Every operation resolves to exactly one of "succeeded with a result" or
//! "failed with one error kind". The kinds mirror the stages an object
//! operation passes through: directory, sign-in, session resolution,
//! credential exchange and the storage request itself.

use std::fmt;
use thiserror::Error;

/// The unified error type for ferry operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The directory refused a registration or confirmation.
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Sign-in was rejected.
    #[error("authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// An operation was attempted without a valid login session.
    #[error("not authenticated: sign in first")]
    NotAuthenticated,

    /// The identity pool refused to exchange the session's token.
    #[error("credential exchange error: {0}")]
    CredentialExchange(#[from] CredentialExchangeError),

    /// The storage request failed (network or service side).
    #[error("storage service error: {0}")]
    Storage(#[from] StorageServiceError),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input validation errors (object keys, links).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The directory client's session storage failed.
    #[error("session store error: {message}")]
    SessionStore { message: String },
}

impl Error {
    /// Returns the service error code, if the failure carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Directory(DirectoryError::Rejected(fault))
            | Error::Authentication(AuthenticationError::Rejected(fault))
            | Error::CredentialExchange(CredentialExchangeError::Rejected(fault))
            | Error::Storage(StorageServiceError::Rejected(fault)) => fault.code.as_deref(),
            _ => None,
        }
    }
}

/// A rejection reported by a remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFault {
    /// Service error code (e.g. `NotAuthorizedException`).
    pub code: Option<String>,
    /// Human-readable message from the service.
    pub message: Option<String>,
}

impl ServiceFault {
    /// Create a new service fault.
    pub fn new(code: Option<String>, message: Option<String>) -> Self {
        Self { code, message }
    }

    /// Create a fault from static code and message strings.
    pub fn coded(code: &str, message: impl Into<String>) -> Self {
        Self::new(Some(code.to_string()), Some(message.into()))
    }
}

impl fmt::Display for ServiceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "[{}] {}", code, message),
            (Some(code), None) => write!(f, "[{}]", code),
            (None, Some(message)) => write!(f, "{}", message),
            (None, None) => write!(f, "unspecified service error"),
        }
    }
}

/// Registration and confirmation failures.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory refused the request.
    #[error("{0}")]
    Rejected(ServiceFault),

    /// The directory could not be reached.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

/// Sign-in failures.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// The directory rejected the credentials or the account state.
    #[error("{0}")]
    Rejected(ServiceFault),

    /// The directory asked for a challenge this client cannot answer.
    #[error("unsupported challenge: {challenge}")]
    UnsupportedChallenge { challenge: String },

    /// The directory answered with a malformed challenge or result.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// The directory could not be reached.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

/// Identity pool exchange failures.
#[derive(Debug, Error)]
pub enum CredentialExchangeError {
    /// The identity pool refused the token.
    #[error("{0}")]
    Rejected(ServiceFault),

    /// The identity pool answered without usable credentials.
    #[error("identity pool returned no {field}")]
    MissingField { field: &'static str },

    /// The identity pool could not be reached.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

/// Object request failures.
#[derive(Debug, Error)]
pub enum StorageServiceError {
    /// The storage service refused the request.
    #[error("{0}")]
    Rejected(ServiceFault),

    /// The request could not be signed.
    #[error("signing failed: {message}")]
    Signing { message: String },

    /// The storage service could not be reached.
    #[error("transport failure: {message}")]
    Transport { message: String },
}

/// Configuration errors, raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required setting {name}")]
    Missing { name: &'static str },

    /// A variable is set but cannot be used.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid object key.
    #[error("invalid object key '{value}': {reason}")]
    ObjectKey { value: String, reason: String },

    /// Invalid URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
