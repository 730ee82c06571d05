//! Object subcommands.

mod delete;
mod link;
mod list;
mod upload;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::backend::CliFerry;

#[derive(Args, Debug)]
pub struct ObjectCommand {
    #[command(subcommand)]
    pub command: ObjectSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ObjectSubcommand {
    /// Upload a file
    Upload(upload::UploadArgs),

    /// List objects in the bucket
    List(list::ListArgs),

    /// Delete an object
    Delete(delete::DeleteArgs),

    /// Print a time-limited download link
    Link(link::LinkArgs),
}

pub async fn handle(cmd: ObjectCommand, ferry: &CliFerry) -> Result<()> {
    match cmd.command {
        ObjectSubcommand::Upload(args) => upload::run(args, ferry).await,
        ObjectSubcommand::List(args) => list::run(args, ferry).await,
        ObjectSubcommand::Delete(args) => delete::run(args, ferry).await,
        ObjectSubcommand::Link(args) => link::run(args, ferry).await,
    }
}
