//! CLI integration tests against the filesystem backend.

mod common;

use std::path::PathBuf;

use tempfile::TempDir;
use url::Url;

use common::{run_cli_with_env, run_cli_with_env_success};

struct Env {
    _temp: TempDir,
    home: PathBuf,
    root: String,
}

fn env() -> Env {
    let temp = TempDir::new().unwrap();
    let home = temp.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    let root = temp.path().join("backend").display().to_string();
    Env {
        _temp: temp,
        home,
        root,
    }
}

fn signed_in(env: &Env) {
    run_cli_with_env_success(
        &[
            "--local", &env.root, "auth", "sign-up", "--username", "alice@example.com",
            "--password", "correct horse",
        ],
        &env.home,
    );
    run_cli_with_env_success(
        &[
            "--local", &env.root, "auth", "sign-in", "--username", "alice@example.com",
            "--password", "correct horse",
        ],
        &env.home,
    );
}

#[test]
fn test_missing_configuration_fails_fast() {
    let env = env();
    let output = run_cli_with_env(&["object", "list"], &env.home);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("FERRY_USER_POOL_ID"), "stderr: {}", stderr);
}

#[test]
fn test_whoami_without_session() {
    let env = env();
    let output = run_cli_with_env(&["--local", &env.root, "auth", "whoami"], &env.home);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No active session"));
}

#[test]
fn test_sign_in_and_whoami() {
    let env = env();
    signed_in(&env);

    let stdout = run_cli_with_env_success(
        &["--local", &env.root, "auth", "whoami", "--json"],
        &env.home,
    );
    let identity: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(identity["username"], "alice@example.com");
}

#[test]
fn test_wrong_password_is_rejected() {
    let env = env();
    signed_in(&env);

    let output = run_cli_with_env(
        &[
            "--local", &env.root, "auth", "sign-in", "--username", "alice@example.com",
            "--password", "wrong horse",
        ],
        &env.home,
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("NotAuthorizedException"));
}

#[test]
fn test_object_lifecycle() {
    let env = env();
    signed_in(&env);

    let file = env.home.join("notes.txt");
    std::fs::write(&file, "hello ferry").unwrap();

    let stdout = run_cli_with_env_success(
        &[
            "--local",
            &env.root,
            "object",
            "upload",
            file.to_str().unwrap(),
            "--content-type",
            "text/plain",
        ],
        &env.home,
    );
    let key = stdout
        .lines()
        .find(|line| line.contains("Key"))
        .and_then(|line| line.rsplit_once(": "))
        .map(|(_, k)| k.trim().to_string())
        .expect("upload prints the key");
    assert!(key.ends_with("-notes.txt"));

    let listing = run_cli_with_env_success(
        &["--local", &env.root, "object", "list", "--json"],
        &env.home,
    );
    let records: Vec<serde_json::Value> = listing
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["key"], key.as_str());
    assert_eq!(records[0]["size"], 11);

    let link = run_cli_with_env_success(&["--local", &env.root, "object", "link", &key], &env.home);
    let url = Url::parse(link.trim()).unwrap();
    assert_eq!(url.scheme(), "file");
    assert_eq!(
        std::fs::read_to_string(url.to_file_path().unwrap()).unwrap(),
        "hello ferry"
    );

    run_cli_with_env_success(&["--local", &env.root, "object", "delete", &key], &env.home);
    run_cli_with_env_success(&["--local", &env.root, "object", "delete", &key], &env.home);

    let listing = run_cli_with_env_success(
        &["--local", &env.root, "object", "list", "--json"],
        &env.home,
    );
    assert!(listing.trim().is_empty());
}

#[test]
fn test_sign_out_blocks_object_operations() {
    let env = env();
    signed_in(&env);

    run_cli_with_env_success(&["--local", &env.root, "auth", "sign-out"], &env.home);
    run_cli_with_env_success(&["--local", &env.root, "auth", "sign-out"], &env.home);

    let output = run_cli_with_env(&["--local", &env.root, "object", "list"], &env.home);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not authenticated"));
}
