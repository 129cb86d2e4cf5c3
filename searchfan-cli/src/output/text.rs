//! Text output formatting with progress bars and colors.

use searchfan_core::{BackendConfig, CreditSnapshot, StrategyResult};
use searchfan_engine::ValidationReport;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats a strategy result: merged items plus the attempts footer.
    pub fn format_results(&self, result: &StrategyResult, verbose: bool) -> String {
        let mut lines = Vec::new();

        if result.results.is_empty() {
            lines.push(self.dim("No results."));
        }

        for (index, item) in result.results.iter().enumerate() {
            lines.push(format!(
                "{:>2}. {} {}",
                index + 1,
                self.bold(&item.title),
                self.dim(&format!("[{}]", item.source_backend))
            ));
            lines.push(format!("    {}", self.cyan(&item.url)));
            if !item.snippet.is_empty() {
                lines.push(format!("    {}", item.snippet));
            }
        }

        if verbose || result.results.is_empty() {
            lines.push(String::new());
            lines.push(self.format_attempts(result));
        }

        lines.join("\n")
    }

    /// Formats the per-back-end attempts footer.
    pub fn format_attempts(&self, result: &StrategyResult) -> String {
        let mut lines = vec![self.bold("Backends:").to_string()];
        for attempt in &result.attempts {
            let status = if attempt.success {
                self.green("✓ ok")
            } else {
                let reason = attempt.reason.as_deref().unwrap_or("failed");
                match reason {
                    "low_credit" => self.yellow(&format!("- skipped ({reason})")),
                    "cancelled" => self.dim(&format!("- {reason}")),
                    _ => self.red(&format!("✗ {reason}")),
                }
            };
            lines.push(format!("  {:<15} {}", attempt.backend_id, status));
        }
        lines.join("\n")
    }

    /// Formats credit snapshots with a remaining-credit bar per back-end.
    pub fn format_snapshots(&self, snapshots: &[CreditSnapshot]) -> String {
        let mut lines = vec![self.bold("Monthly credits:").to_string()];
        for snapshot in snapshots {
            let remaining_pct = if snapshot.quota == 0 {
                0.0
            } else {
                snapshot.remaining as f64 / snapshot.quota as f64 * 100.0
            };
            let bar = self.progress_bar(remaining_pct);
            let summary = format!("{}/{} left", snapshot.remaining, snapshot.quota);
            let summary = if snapshot.is_exhausted {
                self.red(&format!("{summary} (exhausted)"))
            } else {
                self.color_for_percent(remaining_pct, &summary)
            };
            lines.push(format!("  {:<15} {} {}", snapshot.backend_id, bar, summary));
        }
        lines.join("\n")
    }

    /// Formats the configured back-end listing.
    pub fn format_backends(&self, backends: &[BackendConfig]) -> String {
        let mut lines = vec![self.bold("Configured backends:").to_string()];
        for backend in backends {
            let endpoint = backend.endpoint.as_deref().unwrap_or("-");
            lines.push(format!(
                "  {:<15} quota {:<8} cost {:<4} {}",
                backend.id,
                backend.monthly_quota,
                backend.cost_per_search,
                self.dim(endpoint)
            ));
        }
        lines.join("\n")
    }

    /// Formats a validation report.
    pub fn format_validation(&self, report: &ValidationReport) -> String {
        let mut lines = Vec::new();
        if report.valid {
            lines.push(self.green("✓ configuration is valid"));
        } else {
            lines.push(self.red("✗ configuration is invalid"));
        }
        for error in &report.errors {
            lines.push(format!("  {} {}", self.red("error:"), error));
        }
        for warning in &report.warnings {
            lines.push(format!("  {} {}", self.yellow("warning:"), warning));
        }
        lines.join("\n")
    }

    /// Renders a remaining-percentage progress bar.
    fn progress_bar(&self, remaining_pct: f64) -> String {
        let filled = ((remaining_pct / 100.0) * self.bar_width as f64).round() as usize;
        let filled = filled.min(self.bar_width);
        let bar: String = std::iter::repeat(BAR_FULL)
            .take(filled)
            .chain(std::iter::repeat(BAR_EMPTY).take(self.bar_width - filled))
            .collect();
        self.color_for_percent(remaining_pct, &bar)
    }

    fn color_for_percent(&self, remaining_pct: f64, text: &str) -> String {
        if remaining_pct <= 10.0 {
            self.red(text)
        } else if remaining_pct <= 30.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

// ============================================================================
// Tests
// ============================================================================
