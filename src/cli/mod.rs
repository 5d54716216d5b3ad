//! CLI entry point for glean-auth.

pub mod auth;

use clap::{Parser, Subcommand};

/// Glean credential manager CLI.
#[derive(Parser, Debug)]
#[command(name = "glean-auth", version, about = "Glean device-flow credential manager")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize this machine against the configured Glean server
    Login(LoginArgs),
    /// Show credential status
    Status,
    /// Force a token refresh
    Refresh,
    /// Remove stored credentials
    Logout,
}

/// Arguments for the `login` subcommand.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Also mirror credentials for the companion proxy tool
    #[arg(long)]
    pub mirror: bool,
}
