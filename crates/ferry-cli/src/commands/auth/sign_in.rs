//! Sign-in command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use ferry_core::Credentials;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct SignInArgs {
    /// Username or email address
    #[arg(long)]
    pub username: String,

    /// Password
    #[arg(long, env = "FERRY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: SignInArgs, ferry: &CliFerry) -> Result<()> {
    eprintln!("{}", "Signing in...".dimmed());

    let session = ferry
        .sign_in(Credentials::new(&args.username, &args.password))
        .await
        .context("Failed to sign in")?;

    output::success("Signed in successfully");
    println!();
    output::field("Username", &session.identity().username);
    output::field("ID", &session.identity().id);
    output::field("Expires", &session.expires_at().to_rfc3339());

    Ok(())
}
