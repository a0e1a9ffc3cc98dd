//! CLI binary for docbundle.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, runs the pipeline, and prints the result. With no flags
//! it builds the bundle for the project in the current directory.

use anyhow::{Context, Result};
use clap::Parser;
use docbundle::{
    check_tools, run, PipelineConfig, PipelineProgressCallback, PipelineStats, ProgressCallback,
    Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the current stage, plus one
/// log line per finished stage and per reference document.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_no: AtomicUsize,
    total_stages: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Arc<Self> {
        Arc::new(Self {
            bar,
            stage_no: AtomicUsize::new(0),
            total_stages: AtomicUsize::new(0),
        })
    }

    /// Remove the spinner line; called on success and on a fatal error.
    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_run_start(&self, stages: usize) {
        self.total_stages.store(stages, Ordering::SeqCst);
    }

    fn on_stage_start(&self, stage: Stage) {
        let n = self.stage_no.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total_stages.load(Ordering::SeqCst);
        self.bar.set_prefix(format!("[{n}/{total}]"));
        self.bar.set_message(stage.label());
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.bar.println(format!("  {} {}", green("✓"), stage.label()));
    }

    fn on_document_converted(&self, display_name: &str, pages: usize) {
        self.bar.println(format!(
            "      {} {}  {}",
            green("•"),
            display_name,
            dim(&format!("{pages} page image(s)"))
        ));
    }

    fn on_document_skipped(&self, display_name: &str, reason: &str) {
        self.bar.println(format!(
            "      {} {}  {}",
            yellow("⚠"),
            display_name,
            dim(reason)
        ));
    }

    fn on_run_complete(&self, _stats: &PipelineStats) {
        self.finish();
    }
}

/// Assemble API docs, diagrams, narrative and reference PDFs into one bundle.
#[derive(Parser, Debug)]
#[command(
    name = "docbundle",
    version,
    about = "Assemble API docs, diagrams, narrative and reference PDFs into one documentation bundle",
    long_about = "Runs doxygen over src/, renders docs/diagrams/*.puml with plantuml, converts \
README.md to HTML and PDF with pandoc, converts every docs/references/*.pdf to Markdown with \
page images, and writes docs/output/documents/index.md linking everything. \
All flags are optional; the defaults describe the standard project layout.",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Project root that all input paths are relative to.
    #[arg(long, env = "DOCBUNDLE_PROJECT_ROOT", default_value = ".")]
    project_root: PathBuf,

    /// Output root, relative to the project root.
    #[arg(short, long, env = "DOCBUNDLE_OUTPUT", default_value = "docs/output")]
    output: PathBuf,

    /// Keep the existing output tree instead of clearing it first.
    #[arg(long, env = "DOCBUNDLE_NO_CLEAN")]
    no_clean: bool,

    /// Only report where each required tool resolves, then exit.
    #[arg(long)]
    check: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "DOCBUNDLE_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCBUNDLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs (every tool command line).
    #[arg(short, long, env = "DOCBUNDLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCBUNDLE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Warnings (skipped documents) and errors always reach stderr; INFO is
    // hidden while the spinner is active since it reports the same thing.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.check;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let spinner = show_progress.then(CliProgressCallback::new);
    let progress = spinner.clone().map(|cb| cb as ProgressCallback);
    let config = build_config(&cli, progress)?;

    // ── Check-only mode ──────────────────────────────────────────────────
    if cli.check {
        let mut missing = 0;
        for (tool, path) in check_tools(&config) {
            match path {
                Some(p) => println!("{} {:<12} {}", green("✓"), tool, dim(&p.display().to_string())),
                None => {
                    missing += 1;
                    println!("{} {:<12} {}", red("✗"), tool, red("not found"));
                }
            }
        }
        if missing > 0 {
            anyhow::bail!("{missing} required tool(s) missing");
        }
        return Ok(());
    }

    // ── Run pipeline ─────────────────────────────────────────────────────
    let report = match run(&config).await {
        Ok(report) => report,
        Err(e) => {
            // on_run_complete never fires on a fatal error.
            if let Some(ref cb) = spinner {
                cb.finish();
            }
            return Err(e).context("Documentation build failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &report.stats;
        eprintln!(
            "{}  {} diagram(s), {} document(s){}  {}ms  →  {}",
            if stats.documents_skipped == 0 {
                green("✔")
            } else {
                yellow("⚠")
            },
            stats.diagrams_rendered,
            stats.documents_converted,
            if stats.documents_skipped == 0 {
                String::new()
            } else {
                format!(", {} skipped", stats.documents_skipped)
            },
            stats.total_duration_ms,
            bold(&report.index_path.display().to_string()),
        );
        for skipped in &report.skipped {
            eprintln!("   {} {}", yellow("skipped"), skipped.error);
        }
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .project_root(&cli.project_root)
        .output_root(&cli.output)
        .clean_output(!cli.no_clean);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_is_cleared_when_the_run_fails() {
        let cb = CliProgressCallback::with_bar(ProgressBar::hidden());
        cb.on_run_start(Stage::ALL.len());
        cb.on_stage_start(Stage::VerifyTools);
        assert!(!cb.bar.is_finished());

        cb.finish();
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn no_flags_means_the_standard_layout() {
        let cli = Cli::parse_from(["docbundle"]);
        let config = build_config(&cli, None).unwrap();
        assert!(config.clean_output);
        assert!(config.workspace().index_path().ends_with("docs/output/documents/index.md"));
    }
}
