//! End-to-end tests of the filesystem backend through the `Ferry` facade.

use std::sync::Arc;
use std::time::Duration;

use ferry_core::{Credentials, Error, Ferry, MemorySessionStore, ObjectKey, SessionState, UploadFile};
use ferry_file::{FileBroker, FileDirectory, FileStorageProvider};
use tempfile::TempDir;

type LocalFerry = Ferry<FileDirectory, FileBroker, FileStorageProvider>;

fn ferry(dir: &TempDir) -> LocalFerry {
    let directory = FileDirectory::new(dir.path(), Arc::new(MemorySessionStore::new()));
    let broker = FileBroker::new(directory.clone());
    let provider = FileStorageProvider::new(directory.store().clone(), "ferry-local");
    Ferry::new(directory, broker, provider, Duration::from_secs(3600))
}

#[tokio::test]
async fn operations_fail_closed_without_session() {
    let dir = TempDir::new().unwrap();
    let ferry = ferry(&dir);

    assert!(ferry.current_session().await.is_none());

    let err = ferry
        .upload(UploadFile::new("a.txt", "text/plain", b"a".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));
    assert!(matches!(ferry.list().await.unwrap_err(), Error::NotAuthenticated));

    // Nothing was written to the bucket.
    assert!(!dir.path().join("buckets").exists());
}

#[tokio::test]
async fn full_object_lifecycle() {
    let dir = TempDir::new().unwrap();
    let ferry = ferry(&dir);

    ferry
        .sign_up(Credentials::new("alice@example.com", "correct horse"))
        .await
        .unwrap();
    ferry
        .sign_in(Credentials::new("alice@example.com", "correct horse"))
        .await
        .unwrap();
    assert_eq!(ferry.state(), SessionState::Authenticated);

    let identity = ferry.current_session().await.unwrap();
    assert_eq!(identity.username, "alice@example.com");

    let first = ferry
        .upload(UploadFile::new("notes.txt", "text/plain", b"one".to_vec()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = ferry
        .upload(UploadFile::new("notes.txt", "text/plain", b"two".to_vec()))
        .await
        .unwrap();
    assert_ne!(first, second);
    assert!(first.as_str().ends_with("-notes.txt"));

    let keys: Vec<ObjectKey> = ferry.list().await.unwrap().into_iter().map(|r| r.key).collect();
    assert!(keys.contains(&first));
    assert!(keys.contains(&second));

    let link = ferry.download_link(&first).await.unwrap();
    assert_eq!(link.scheme(), "file");
    assert!(link.query().unwrap().contains("X-Ferry-Expires=3600"));

    ferry.delete(&first).await.unwrap();
    ferry.delete(&first).await.unwrap();
    let keys: Vec<ObjectKey> = ferry.list().await.unwrap().into_iter().map(|r| r.key).collect();
    assert_eq!(keys, vec![second]);

    ferry.sign_out().await;
    ferry.sign_out().await;
    assert_eq!(ferry.state(), SessionState::SignedOut);
    assert!(matches!(ferry.list().await.unwrap_err(), Error::NotAuthenticated));
}

#[tokio::test]
async fn link_for_never_uploaded_key() {
    let dir = TempDir::new().unwrap();
    let ferry = ferry(&dir);
    ferry.sign_up(Credentials::new("bob", "password1")).await.unwrap();
    ferry.sign_in(Credentials::new("bob", "password1")).await.unwrap();

    let link = ferry
        .download_link(&ObjectKey::new("missing.bin").unwrap())
        .await
        .unwrap();
    assert!(url::Url::parse(link.as_str()).is_ok());
}
