//! Backends command - list configured back-ends.

use anyhow::Result;

use crate::commands::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the backends command.
pub async fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_backends(&ctx.config.backends)?);
        }
        OutputFormat::Text => {
            if ctx.config.backends.is_empty() {
                println!(
                    "No backends configured. Edit {}",
                    crate::commands::default_config_display().display()
                );
                return Ok(());
            }
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_backends(&ctx.config.backends));
        }
    }

    Ok(())
}
