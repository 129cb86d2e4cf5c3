//! Service command - manage the supervised local search service.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::sync::Arc;

use searchfan_engine::LifecycleSupervisor;

use crate::commands::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::output::json::ServiceStatusOutput;
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the service command.
#[derive(Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub action: ServiceAction,
}

/// Service subcommands.
#[derive(Subcommand)]
pub enum ServiceAction {
    /// Start the service and wait until it is healthy.
    Start,
    /// Stop the service.
    Stop,
    /// Show the service's process and lifecycle state.
    Status,
    /// Validate the service configuration without touching the service.
    Validate,
}

/// Runs the service command.
pub async fn run(args: &ServiceArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let supervisor = ctx
        .supervisor
        .clone()
        .context("no service configured; add a \"service\" section to the config")?;

    match args.action {
        ServiceAction::Start => start(&supervisor, cli).await,
        ServiceAction::Stop => {
            supervisor.shutdown().await;
            if !cli.quiet {
                println!("Service stopped.");
            }
            Ok(())
        }
        ServiceAction::Status => status(&supervisor, cli).await,
        ServiceAction::Validate => validate(&supervisor, cli),
    }
}

async fn start(supervisor: &Arc<LifecycleSupervisor>, cli: &Cli) -> Result<()> {
    let state = supervisor.init().await?;
    if !cli.quiet {
        println!("Service is {state}.");
    }
    Ok(())
}

async fn status(supervisor: &Arc<LifecycleSupervisor>, cli: &Cli) -> Result<()> {
    let running = supervisor.is_running().await;
    let state = supervisor.state().await;

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = ServiceStatusOutput {
                backend_id: supervisor.config().backend_id.clone(),
                state: state.to_string(),
                process_running: running,
            };
            println!("{}", formatter.format(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "{}: process {}, lifecycle {}",
                supervisor.config().backend_id,
                if running { "running" } else { "stopped" },
                state
            );
        }
    }

    Ok(())
}

fn validate(supervisor: &Arc<LifecycleSupervisor>, cli: &Cli) -> Result<()> {
    let report = supervisor.validate();

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&report)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_validation(&report));
        }
    }

    if !report.valid {
        std::process::exit(ExitCode::ConfigError as i32);
    }

    Ok(())
}
