//! Credits command - show monthly credit usage per back-end.

use anyhow::Result;
use clap::Args;

use crate::commands::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the credits command.
#[derive(Args, Default)]
pub struct CreditsArgs {
    /// Show only this back-end.
    #[arg(long, short)]
    pub backend: Option<String>,
}

/// Runs the credits command.
pub async fn run(args: &CreditsArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;

    let snapshots = match &args.backend {
        Some(id) => vec![ctx.ledger.snapshot(id).await?],
        None => ctx.ledger.all_snapshots().await,
    };

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_snapshots(&snapshots)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_snapshots(&snapshots));
        }
    }

    Ok(())
}
