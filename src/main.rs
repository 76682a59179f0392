mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lushsync")]
#[command(about = "Sync a StoreForce retail schedule into Google Calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Google OAuth consent flow and cache the token
    Auth,
    /// Scrape the portal schedule and update the configured calendars
    Sync {
        /// Only sync this portal username
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth => commands::auth::run().await,
        Commands::Sync { user } => commands::sync::run(user.as_deref()).await,
    }
}
