//! Docport CLI - Documentation portal.
//!
//! Provides commands for:
//! - `serve`: Start the portal API server
//! - `tree`: Print the navigation tree
//! - `check`: Report hierarchy problems in the section database

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, ServeArgs, TreeArgs};
use output::Output;

/// Docport - Documentation portal.
#[derive(Parser)]
#[command(name = "docport", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the portal API server.
    Serve(ServeArgs),
    /// Print the navigation tree.
    Tree(TreeArgs),
    /// Check the section hierarchy for problems.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            output.error(&format!("Error: failed to create tokio runtime: {err}"));
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Serve(args) => args.execute().await,
            Commands::Tree(args) => args.execute().await,
            Commands::Check(args) => args.execute().await,
        }
    });

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
