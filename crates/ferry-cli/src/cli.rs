//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::auth::AuthCommand;
use crate::commands::object::ObjectCommand;

/// Session-scoped access to a single storage bucket.
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version = env!("FERRY_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Use the filesystem backend rooted at DIR instead of Cognito and S3
    #[arg(long, value_name = "DIR", env = "FERRY_LOCAL_ROOT", global = true)]
    pub local: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Registration, sign-in and session commands
    Auth(AuthCommand),

    /// Object upload, listing, deletion and download links
    Object(ObjectCommand),
}
