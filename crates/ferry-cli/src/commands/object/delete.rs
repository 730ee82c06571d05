//! Delete command implementation.

use anyhow::{Context, Result};
use clap::Args;

use ferry_core::ObjectKey;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Key of the object to delete
    pub key: ObjectKey,
}

pub async fn run(args: DeleteArgs, ferry: &CliFerry) -> Result<()> {
    ferry
        .delete(&args.key)
        .await
        .context("Failed to delete object")?;

    output::success(&format!("Deleted {}", args.key));
    Ok(())
}
