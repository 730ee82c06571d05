//! On-disk layout for the file-backed backend.
//!
//! ```text
//! <root>/directory/signing.key          hex HMAC key
//! <root>/directory/accounts/<h>.json    one account per username hash
//! <root>/buckets/<bucket>/<h>.bin       object bytes, per key hash
//! <root>/buckets/<bucket>/<h>.json      object metadata
//! ```

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Account metadata stored in the local directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LocalAccount {
    pub username: String,
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Password hash (bcrypt).
    pub password_hash: String,
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<String>,
}

/// Metadata written next to each stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

/// Filesystem layout shared by the local directory, broker and bucket.
///
/// The async methods run their file IO on tokio's blocking pool. Clones
/// share the cached signing key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    signing_key: Arc<OnceLock<Vec<u8>>>,
}

/// Run `f` on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(io::Error::other)?
}

impl FileStore {
    /// Create a store rooted at `root`. Relative roots are made absolute so
    /// download links can be expressed as `file://` URLs.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root,
            signing_key: Arc::new(OnceLock::new()),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn directory_dir(&self) -> PathBuf {
        self.root.join("directory")
    }

    fn accounts_dir(&self) -> PathBuf {
        self.directory_dir().join("accounts")
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join("buckets").join(bucket)
    }

    /// Hex SHA-256 of `value`; keeps arbitrary names filesystem-safe.
    fn hashed(value: &str) -> String {
        hex::encode(Sha256::digest(value.as_bytes()))
    }

    fn account_path(&self, username: &str) -> PathBuf {
        self.accounts_dir()
            .join(format!("{}.json", Self::hashed(username)))
    }

    pub(crate) fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.bucket_dir(bucket)
            .join(format!("{}.bin", Self::hashed(key)))
    }

    fn object_meta_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.bucket_dir(bucket)
            .join(format!("{}.json", Self::hashed(key)))
    }

    /// Run `f` while holding an exclusive lock on `<root>/directory/<name>.lock`.
    fn with_lock<T>(&self, name: &str, f: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
        let dir = self.directory_dir();
        fs::create_dir_all(&dir)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(dir.join(format!("{}.lock", name)))?;

        lock_file.lock_exclusive()?;
        let result = f();
        lock_file.unlock()?;
        result
    }

    /// The HMAC signing key, generated on first use.
    pub(crate) async fn signing_key(&self) -> io::Result<Vec<u8>> {
        if let Some(key) = self.signing_key.get() {
            return Ok(key.clone());
        }
        let store = self.clone();
        blocking(move || store.signing_key_blocking()).await
    }

    /// Like [`signing_key`](Self::signing_key), for sync callers. Only the
    /// first call in a process touches the disk.
    pub(crate) fn signing_key_blocking(&self) -> io::Result<Vec<u8>> {
        if let Some(key) = self.signing_key.get() {
            return Ok(key.clone());
        }

        let path = self.directory_dir().join("signing.key");
        let key = self.with_lock("signing", || {
            if path.exists() {
                let hex_key = fs::read_to_string(&path)?;
                return hex::decode(hex_key.trim())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
            }

            let mut key = vec![0u8; 32];
            OsRng.fill_bytes(&mut key);
            write_atomic(&path, hex::encode(&key).as_bytes())?;
            debug!(path = %path.display(), "Generated signing key");
            Ok(key)
        })?;

        Ok(self.signing_key.get_or_init(|| key).clone())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Create an account, failing with `AlreadyExists` if the username is
    /// taken.
    #[instrument(skip(self, account), fields(username = %account.username))]
    pub(crate) async fn create_account(&self, account: LocalAccount) -> io::Result<()> {
        let path = self.account_path(&account.username);
        let store = self.clone();

        blocking(move || {
            store.with_lock("accounts", || {
                if path.exists() {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("account {} already exists", account.username),
                    ));
                }
                write_json(&path, &account)
            })
        })
        .await?;

        debug!("Created local account");
        Ok(())
    }

    pub(crate) async fn get_account(&self, username: &str) -> io::Result<Option<LocalAccount>> {
        let path = self.account_path(username);
        blocking(move || read_json(&path)).await
    }

    pub(crate) async fn update_account(&self, account: LocalAccount) -> io::Result<()> {
        let path = self.account_path(&account.username);
        let store = self.clone();
        blocking(move || store.with_lock("accounts", || write_json(&path, &account))).await
    }

    // ========================================================================
    // Objects
    // ========================================================================

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub(crate) async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> io::Result<()> {
        let data_path = self.object_path(bucket, key);
        let meta_path = self.object_meta_path(bucket, key);
        let meta = ObjectMeta {
            key: key.to_string(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
        };

        blocking(move || {
            write_atomic(&data_path, &bytes)?;
            write_json(&meta_path, &meta)
        })
        .await?;

        debug!("Stored object");
        Ok(())
    }

    pub(crate) async fn list_objects(&self, bucket: &str) -> io::Result<Vec<ObjectMeta>> {
        let dir = self.bucket_dir(bucket);

        blocking(move || {
            if !dir.exists() {
                return Ok(Vec::new());
            }

            let mut objects = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json")
                    && let Some(meta) = read_json::<ObjectMeta>(&path)?
                {
                    objects.push(meta);
                }
            }
            Ok(objects)
        })
        .await
    }

    /// Remove an object. Removing a missing object succeeds.
    #[instrument(skip(self))]
    pub(crate) async fn delete_object(&self, bucket: &str, key: &str) -> io::Result<()> {
        let paths = [
            self.object_meta_path(bucket, key),
            self.object_path(bucket, key),
        ];

        blocking(move || {
            for path in paths {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })
        .await
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let content = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &content)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
