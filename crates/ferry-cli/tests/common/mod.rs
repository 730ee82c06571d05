use std::path::Path;
use std::process::{Command, Output};

/// Variables the CLI reads; cleared so the host environment cannot leak in.
const FERRY_VARS: &[&str] = &[
    "FERRY_USER_POOL_ID",
    "FERRY_CLIENT_ID",
    "FERRY_IDENTITY_POOL_ID",
    "FERRY_REGION",
    "FERRY_BUCKET",
    "FERRY_LINK_EXPIRY_SECS",
    "FERRY_ENDPOINT_URL",
    "FERRY_LOCAL_ROOT",
    "FERRY_PASSWORD",
];

/// Run the CLI with a custom HOME directory for isolated session storage.
pub fn run_cli_with_env(args: &[&str], home: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ferry"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    for var in FERRY_VARS {
        cmd.env_remove(var);
    }
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI with a custom HOME and expect success.
pub fn run_cli_with_env_success(args: &[&str], home: &Path) -> String {
    let output = run_cli_with_env(args, home);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}
