//! Search command - run one federated query.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use searchfan_backends::build_registry;
use searchfan_core::SearchQuery;
use searchfan_engine::{ExecutionContext, ExecutionOptions, RetryPolicy, StrategyKind};

use crate::commands::{resolve_backend_ids, AppContext};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// The query text.
    pub query: Vec<String>,

    /// Strategy to run (all, first-success).
    #[arg(long, short, default_value = "all")]
    pub strategy: String,

    /// Back-ends to query, comma-separated. Defaults to all configured.
    #[arg(long, short)]
    pub backends: Option<String>,

    /// Maximum results per back-end.
    #[arg(long, short)]
    pub limit: Option<usize>,

    /// Override the concurrency bound.
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Override the per-request timeout, in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Override the attempts per back-end (1 = no retry).
    #[arg(long)]
    pub attempts: Option<u32>,
}

impl Default for SearchArgs {
    fn default() -> Self {
        Self {
            query: Vec::new(),
            strategy: "all".to_string(),
            backends: None,
            limit: None,
            max_concurrent: None,
            timeout: None,
            attempts: None,
        }
    }
}

/// Runs the search command.
pub async fn run(args: &SearchArgs, cli: &Cli) -> Result<()> {
    let text = args.query.join(" ");
    anyhow::ensure!(!text.trim().is_empty(), "empty query");

    let kind: StrategyKind = args
        .strategy
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let ctx = AppContext::load(cli).await?;
    let backend_ids = resolve_backend_ids(&ctx.config, args.backends.as_deref())?;

    info!(strategy = %kind, backends = backend_ids.len(), "Running search");

    // Bring the supervised service up first if one of the selected
    // back-ends depends on it. Init failure degrades to a per-back-end
    // failure during dispatch, not a fatal error.
    if let Some(supervisor) = &ctx.supervisor {
        if backend_ids.contains(&supervisor.config().backend_id) {
            if let Err(error) = supervisor.init().await {
                warn!(error = %error, "Service init failed, continuing without it");
            }
        }
    }

    let registry = Arc::new(build_registry(&ctx.config, ctx.supervisor.as_ref())?);
    let execution = ExecutionContext::new(registry, ctx.ledger.clone());
    let options = build_options(args, &ctx);

    let mut query = SearchQuery::new(text.clone());
    query.limit = args.limit;

    let strategy = kind.build();
    let result = strategy
        .execute(&query, &backend_ids, &options, &execution)
        .await?;

    if let Some(supervisor) = &ctx.supervisor {
        debug!("Shutting down supervised service");
        supervisor.shutdown().await;
    }

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format_results(&text, strategy.name(), &result)?
            );
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_results(&result, cli.verbose));
        }
    }

    if result.successful_backends().is_empty() {
        std::process::exit(ExitCode::BackendFailure as i32);
    }

    Ok(())
}

/// Engine defaults from config, with per-invocation overrides applied.
fn build_options(args: &SearchArgs, ctx: &AppContext) -> ExecutionOptions {
    let mut options = ExecutionOptions::from_config(&ctx.config.engine);
    if let Some(max_concurrent) = args.max_concurrent {
        options = options.with_max_concurrent(max_concurrent);
    }
    if let Some(timeout) = args.timeout {
        options = options.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(attempts) = args.attempts {
        let delay = options.retry.delay;
        options = options.with_retry(RetryPolicy::new(attempts).with_delay(delay));
    }
    options
}
