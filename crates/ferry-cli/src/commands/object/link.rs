//! Link command implementation.

use anyhow::{Context, Result};
use clap::Args;

use ferry_core::ObjectKey;

use crate::backend::CliFerry;

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Key of the object to link
    pub key: ObjectKey,
}

pub async fn run(args: LinkArgs, ferry: &CliFerry) -> Result<()> {
    let url = ferry
        .download_link(&args.key)
        .await
        .context("Failed to sign download link")?;

    // Bare URL so the output can be piped.
    println!("{}", url);
    Ok(())
}
