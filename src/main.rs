//! glean-auth CLI binary entry point.

use clap::Parser;
use glean_auth::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login(args) => glean_auth::cli::auth::handle_login(&args).await,
        Commands::Status => glean_auth::cli::auth::handle_status().await,
        Commands::Refresh => glean_auth::cli::auth::handle_refresh().await,
        Commands::Logout => glean_auth::cli::auth::handle_logout().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
