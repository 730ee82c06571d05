//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the identity as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WhoamiArgs, ferry: &CliFerry) -> Result<()> {
    let identity = ferry
        .current_session()
        .await
        .context("No active session. Run 'ferry auth sign-in' first.")?;

    if args.json {
        return output::json(&identity);
    }

    output::field("Username", &identity.username);
    output::field("ID", &identity.id);
    if let Some(email) = &identity.email {
        output::field("Email", email);
    }
    output::field("Backend", &ferry.describe());

    Ok(())
}
