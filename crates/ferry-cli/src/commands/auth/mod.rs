//! Authentication subcommands.

mod confirm;
mod sign_in;
mod sign_out;
mod sign_up;
mod whoami;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::backend::CliFerry;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Register a new identity
    SignUp(sign_up::SignUpArgs),

    /// Confirm a registration with the emailed code
    Confirm(confirm::ConfirmArgs),

    /// Sign in and store the session
    SignIn(sign_in::SignInArgs),

    /// Forget the stored session
    SignOut(sign_out::SignOutArgs),

    /// Display the signed-in identity
    Whoami(whoami::WhoamiArgs),
}

pub async fn handle(cmd: AuthCommand, ferry: &CliFerry) -> Result<()> {
    match cmd.command {
        AuthSubcommand::SignUp(args) => sign_up::run(args, ferry).await,
        AuthSubcommand::Confirm(args) => confirm::run(args, ferry).await,
        AuthSubcommand::SignIn(args) => sign_in::run(args, ferry).await,
        AuthSubcommand::SignOut(args) => sign_out::run(args, ferry).await,
        AuthSubcommand::Whoami(args) => whoami::run(args, ferry).await,
    }
}
