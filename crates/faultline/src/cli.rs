//! Command-line interface definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Faultline: rule-based fault injection for chaos testing.
#[derive(Debug, Parser)]
#[command(name = "faultline", version, about)]
pub struct Cli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the fault-injection server.
    Serve(ServeArgs),
    /// Print the version and exit.
    Version,
}

/// Arguments for the `serve` command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Override the deployment environment (development, production).
    #[arg(long)]
    pub environment: Option<String>,
}
