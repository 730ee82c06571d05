//! Backend selection for CLI use.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use ferry_aws::AwsFerry;
use ferry_core::{
    Config, Credentials, Ferry, Identity, LoginSession, ObjectKey, ObjectRecord, SignUpOutput,
    StorageSettings, UploadFile,
};
use ferry_file::{FileBroker, FileDirectory, FileStorageProvider};

use crate::session::FileSessionStore;
use crate::session::storage::session_path;

pub type LocalFerry = Ferry<FileDirectory, FileBroker, FileStorageProvider>;

/// Ferry wrapper for CLI use.
pub enum CliFerry {
    Local(LocalFerry),
    Aws(AwsFerry),
}

impl CliFerry {
    /// Open the filesystem backend at `local`, or Cognito and S3 configured
    /// from the environment. Configuration errors surface here, before any
    /// command runs.
    pub fn open(local: Option<&Path>) -> Result<Self> {
        match local {
            Some(root) => {
                let settings =
                    StorageSettings::local_from_env().context("Invalid configuration")?;
                let sessions = Arc::new(FileSessionStore::new(session_path("local-session.json")?));

                let directory = FileDirectory::new(root, sessions);
                let broker = FileBroker::new(directory.clone());
                let provider =
                    FileStorageProvider::new(directory.store().clone(), settings.bucket);

                Ok(CliFerry::Local(Ferry::new(
                    directory,
                    broker,
                    provider,
                    settings.link_expiry,
                )))
            }
            None => {
                let config = Config::from_env().context("Invalid configuration")?;
                let sessions = Arc::new(FileSessionStore::new(session_path("session.json")?));
                Ok(CliFerry::Aws(ferry_aws::connect(&config, sessions)))
            }
        }
    }

    /// Short description of the active backend.
    pub fn describe(&self) -> String {
        match self {
            CliFerry::Local(ferry) => format!(
                "local ({})",
                ferry.gateway().directory().store().root().display()
            ),
            CliFerry::Aws(_) => "cognito + s3".to_string(),
        }
    }

    pub async fn sign_up(&self, credentials: Credentials) -> ferry_core::Result<SignUpOutput> {
        match self {
            CliFerry::Local(ferry) => ferry.sign_up(credentials).await,
            CliFerry::Aws(ferry) => ferry.sign_up(credentials).await,
        }
    }

    pub async fn confirm_sign_up(&self, identifier: &str, code: &str) -> ferry_core::Result<()> {
        match self {
            CliFerry::Local(ferry) => ferry.confirm_sign_up(identifier, code).await,
            CliFerry::Aws(ferry) => ferry.confirm_sign_up(identifier, code).await,
        }
    }

    pub async fn sign_in(&self, credentials: Credentials) -> ferry_core::Result<LoginSession> {
        match self {
            CliFerry::Local(ferry) => ferry.sign_in(credentials).await,
            CliFerry::Aws(ferry) => ferry.sign_in(credentials).await,
        }
    }

    pub async fn current_session(&self) -> Option<Identity> {
        match self {
            CliFerry::Local(ferry) => ferry.current_session().await,
            CliFerry::Aws(ferry) => ferry.current_session().await,
        }
    }

    pub async fn sign_out(&self) {
        match self {
            CliFerry::Local(ferry) => ferry.sign_out().await,
            CliFerry::Aws(ferry) => ferry.sign_out().await,
        }
    }

    pub async fn upload(&self, file: UploadFile) -> ferry_core::Result<ObjectKey> {
        match self {
            CliFerry::Local(ferry) => ferry.upload(file).await,
            CliFerry::Aws(ferry) => ferry.upload(file).await,
        }
    }

    pub async fn list(&self) -> ferry_core::Result<Vec<ObjectRecord>> {
        match self {
            CliFerry::Local(ferry) => ferry.list().await,
            CliFerry::Aws(ferry) => ferry.list().await,
        }
    }

    pub async fn delete(&self, key: &ObjectKey) -> ferry_core::Result<()> {
        match self {
            CliFerry::Local(ferry) => ferry.delete(key).await,
            CliFerry::Aws(ferry) => ferry.delete(key).await,
        }
    }

    pub async fn download_link(&self, key: &ObjectKey) -> ferry_core::Result<Url> {
        match self {
            CliFerry::Local(ferry) => ferry.download_link(key).await,
            CliFerry::Aws(ferry) => ferry.download_link(key).await,
        }
    }
}
