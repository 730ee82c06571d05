//! Sign-up command implementation.

use anyhow::{Context, Result};
use clap::Args;

use ferry_core::Credentials;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct SignUpArgs {
    /// Username or email address to register
    #[arg(long)]
    pub username: String,

    /// Password for the new identity
    #[arg(long, env = "FERRY_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: SignUpArgs, ferry: &CliFerry) -> Result<()> {
    let registered = ferry
        .sign_up(Credentials::new(&args.username, &args.password))
        .await
        .context("Failed to sign up")?;

    output::success("Registered");
    println!();
    output::field("Username", &args.username);
    output::field("User ID", &registered.user_id);

    if !registered.confirmed {
        println!();
        output::hint(&format!(
            "Check your email, then run 'ferry auth confirm --username {} --code <CODE>'.",
            args.username
        ));
    }

    Ok(())
}
