//! ferry - upload, list, delete and link files in a Cognito-guarded bucket.
//!
//! A thin front end over `ferry-core`. Configuration comes from the
//! environment and is checked before any command runs; `--local <DIR>`
//! swaps Cognito and S3 for the filesystem backend.

mod backend;
mod cli;
mod commands;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use backend::CliFerry;
use cli::{Cli, Commands};
use commands::{auth, object};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    if let Err(e) = run(cli).await {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ferry = CliFerry::open(cli.local.as_deref())?;
    debug!(backend = %ferry.describe(), "Backend ready");

    match cli.command {
        Commands::Auth(cmd) => auth::handle(cmd, &ferry).await,
        Commands::Object(cmd) => object::handle(cmd, &ferry).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays parseable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
