//! Mapping SDK errors into the ferry taxonomy.
//!
//! A response the service produced becomes a `Rejected` fault carrying its
//! error code and message; anything else (dispatch, timeout, unparseable
//! response) becomes a transport failure.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use ferry_core::Error;
use ferry_core::error::{
    AuthenticationError, CredentialExchangeError, DirectoryError, ServiceFault,
    StorageServiceError,
};

/// Classified SDK failure.
enum SdkFailure {
    Rejected(ServiceFault),
    Transport(String),
}

fn classify<E, R>(err: SdkError<E, R>) -> SdkFailure
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => SdkFailure::Rejected(ServiceFault::new(
            service.code().map(str::to_string),
            service.message().map(str::to_string),
        )),
        None => SdkFailure::Transport(DisplayErrorContext(&err).to_string()),
    }
}

pub(crate) fn directory_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match classify(err) {
        SdkFailure::Rejected(fault) => DirectoryError::Rejected(fault).into(),
        SdkFailure::Transport(message) => DirectoryError::Transport { message }.into(),
    }
}

pub(crate) fn authentication_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match classify(err) {
        SdkFailure::Rejected(fault) => AuthenticationError::Rejected(fault).into(),
        SdkFailure::Transport(message) => AuthenticationError::Transport { message }.into(),
    }
}

pub(crate) fn exchange_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match classify(err) {
        SdkFailure::Rejected(fault) => CredentialExchangeError::Rejected(fault).into(),
        SdkFailure::Transport(message) => CredentialExchangeError::Transport { message }.into(),
    }
}

pub(crate) fn storage_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match classify(err) {
        SdkFailure::Rejected(fault) => StorageServiceError::Rejected(fault).into(),
        SdkFailure::Transport(message) => StorageServiceError::Transport { message }.into(),
    }
}
