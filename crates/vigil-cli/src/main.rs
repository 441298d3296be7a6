//! Vigil CLI - session checks and scenario replay
//!
//! Features:
//! - Log in, verify and log out against the session boundary
//! - Anonymous session check (expects a rejection)
//! - Replay a JSON scenario of widget inputs through the core

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod scenario;

/// Vigil CLI - gated video widget toolkit
#[derive(Parser)]
#[command(name = "vigil-cli")]
#[command(version)]
#[command(about = "Session boundary checks and widget scenario replay", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Base URL of the session endpoints
    #[arg(long, default_value = "http://localhost:5000/api")]
    api: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, check the protected route, optionally log out
    Session {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Log out after the check
        #[arg(long)]
        logout: bool,
    },

    /// Check the protected route without credentials
    Check,

    /// Replay a widget scenario through the core
    Simulate {
        /// Scenario JSON file
        scenario: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    vigil_core::init();

    match cli.command {
        Commands::Session { username, password, logout } => {
            commands::session(&cli.api, cli.timeout, username, password, logout, &cli.format).await?;
        }
        Commands::Check => {
            commands::check(&cli.api, cli.timeout, &cli.format).await?;
        }
        Commands::Simulate { scenario } => {
            commands::simulate(&scenario, &cli.format)?;
        }
    }

    Ok(())
}
