//! Sign-out command implementation.

use anyhow::Result;
use clap::Args;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct SignOutArgs {}

pub async fn run(_args: SignOutArgs, ferry: &CliFerry) -> Result<()> {
    ferry.sign_out().await;
    output::success("Signed out");
    Ok(())
}
