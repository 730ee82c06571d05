//! Session storage for persisting sign-in state between invocations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use directories::ProjectDirs;
use tokio::io::AsyncWriteExt;

use ferry_core::{Error, LoginSession, PersistedSession, SessionStore};


/// Get the path of `file_name` in the CLI's data directory, creating the
/// directory if needed.
pub fn session_path(file_name: &str) -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "ferry").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join(file_name))
}

fn store_error(action: &str, path: &Path, err: impl std::fmt::Display) -> Error {
    Error::SessionStore {
        message: format!("failed to {} {}: {}", action, path.display(), err),
    }
}

/// A session kept in a JSON file readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> ferry_core::Result<Option<LoginSession>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error("read", &self.path, e)),
        };

        let stored: PersistedSession =
            serde_json::from_str(&json).map_err(|e| store_error("parse", &self.path, e))?;
        Ok(Some(stored.into()))
    }

    async fn save(&self, session: &LoginSession) -> ferry_core::Result<()> {
        let json = serde_json::to_string_pretty(&session.to_persisted())
            .map_err(|e| store_error("encode", &self.path, e))?;

        // Owner-only from creation; the rename keeps the mode.
        let temp_path = self.path.with_extension("json.tmp");
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&temp_path)
            .await
            .map_err(|e| store_error("create", &temp_path, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| store_error("protect", &temp_path, e))?;
        }
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| store_error("write", &temp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| store_error("write", &temp_path, e))?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| store_error("replace", &self.path, e))
    }

    async fn clear(&self) -> ferry_core::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_error("remove", &self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use ferry_core::{AccessToken, IdToken, Identity, RefreshToken};
    use tempfile::TempDir;

    fn session() -> LoginSession {
        LoginSession::new(
            Identity::new("alice", "sub-1").with_email("alice@example.com"),
            IdToken::new("id"),
            AccessToken::new("access"),
            Some(RefreshToken::new("refresh")),
            Utc::now() + Duration::hours(1),
        )
    }

    #[tokio::test]
    async fn save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert!(store.load().await.unwrap().is_none());

        let session = session();
        store.save(&session).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.identity(), session.identity());
        assert_eq!(loaded.expires_at().timestamp(), session.expires_at().timestamp());

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        FileSessionStore::new(&path).save(&session()).await.unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn readable_file_is_replaced_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        fs::write(path.with_extension("json.tmp"), "stale").unwrap();
        fs::set_permissions(
            path.with_extension("json.tmp"),
            fs::Permissions::from_mode(0o644),
        )
        .unwrap();

        FileSessionStore::new(&path).save(&session()).await.unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let err = FileSessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, Error::SessionStore { .. }));
    }
}
