//! List command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::backend::CliFerry;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print one JSON record per line
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ListArgs, ferry: &CliFerry) -> Result<()> {
    let records = ferry.list().await.context("Failed to list objects")?;

    if args.json {
        for record in &records {
            output::json(record)?;
        }
        return Ok(());
    }

    if records.is_empty() {
        println!("No objects.");
        return Ok(());
    }

    for record in &records {
        output::record(record);
    }

    Ok(())
}
