//! Confirm command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct ConfirmArgs {
    /// Username the code was sent for
    #[arg(long)]
    pub username: String,

    /// Confirmation code
    #[arg(long)]
    pub code: String,
}

pub async fn run(args: ConfirmArgs, ferry: &CliFerry) -> Result<()> {
    ferry
        .confirm_sign_up(&args.username, &args.code)
        .await
        .context("Failed to confirm registration")?;

    output::success("Registration confirmed");
    Ok(())
}
