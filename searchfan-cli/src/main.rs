// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! SearchFan CLI - federated search from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Query every configured backend
//! searchfan search rust async runtime
//!
//! # Stop at the first backend that answers
//! searchfan search --strategy first-success rust async runtime
//!
//! # Restrict to specific backends
//! searchfan search --backends searx,meili rust
//!
//! # JSON output
//! searchfan search --format json --pretty rust
//!
//! # Monthly credit usage
//! searchfan credits
//!
//! # Supervised service management
//! searchfan service start
//! searchfan service validate
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{backends, credits, search, service};

// ============================================================================
// CLI Definition
// ============================================================================

/// SearchFan CLI - federated search across multiple back-ends.
#[derive(Parser)]
#[command(name = "searchfan")]
#[command(about = "Federated search CLI")]
#[command(long_about = r#"
SearchFan fans one query out across multiple search back-ends, under
per-backend monthly credit quotas, and merges the results in backend
configuration order.

Examples:
  searchfan search rust async           # All backends
  searchfan search -s first-success rust # First answer wins
  searchfan credits                     # Monthly credit usage
  searchfan backends                    # Configured backends
  searchfan service status              # Supervised service state
"#)]
#[command(version)]
#[command(author = "SearchFan Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'search' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Path to the configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the usage state file.
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a federated search (default if no command specified).
    #[command(visible_alias = "s")]
    Search(search::SearchArgs),

    /// Show monthly credit usage per back-end.
    #[command(visible_alias = "c")]
    Credits(credits::CreditsArgs),

    /// List configured back-ends.
    #[command(visible_alias = "b")]
    Backends,

    /// Manage the supervised local search service.
    Service(service::ServiceArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Invalid configuration.
    ConfigError = 2,
    /// No back-end produced results.
    BackendFailure = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("searchfan=debug,info")
    } else {
        EnvFilter::new("searchfan=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Search(args)) => search::run(args, &cli).await,
        Some(Commands::Credits(args)) => credits::run(args, &cli).await,
        Some(Commands::Backends) => backends::run(&cli).await,
        Some(Commands::Service(args)) => service::run(args, &cli).await,
        None => {
            // Default to search command
            search::run(&search::SearchArgs::default(), &cli).await
        }
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
