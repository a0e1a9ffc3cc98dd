//! # docbundle
//!
//! Assemble a project's documentation into one navigable bundle: API
//! reference, rendered diagrams, the narrative README as HTML and PDF, and
//! every reference PDF converted to Markdown with page images, all linked
//! from a single index page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! inputs (project root)                 outputs (docs/output)
//!
//!  ├─ 1. Verify      doxygen, plantuml, pandoc, wkhtmltopdf, pdftohtml, pdftoppm on PATH
//!  ├─ 2. Workspace   ─────────────────▶ diagrams/  documents/  documents/pdf/
//!  ├─ 3. src/ + Doxyfile ─────────────▶ api/
//!  ├─ 4. docs/diagrams/*.puml ────────▶ diagrams/<stem>.svg + .pdf
//!  ├─ 5. README.md ───────────────────▶ documents/README.html + .pdf
//!  ├─ 6. docs/references/*.pdf ───────▶ documents/pdf/<safe>.md + <safe>_figures/
//!  └─ 7. Index ───────────────────────▶ documents/index.md
//! ```
//!
//! Stages run strictly one after another and every external tool call is
//! awaited before the next begins. Any stage failing aborts the run, with one
//! exception: a reference PDF the extractor cannot read is skipped and the
//! rest of the batch continues.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docbundle::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .project_root("/srv/dlms-cosem")
//!         .build()?;
//!     let report = run(&config).await?;
//!     println!("index: {}", report.index_path.display());
//!     for skipped in &report.skipped {
//!         eprintln!("skipped: {}", skipped.display_name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docbundle` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;
pub mod tool;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, ToolSet, Workspace};
pub use error::{DocBundleError, DocumentError};
pub use output::{
    ConvertedDocument, NarrativeOutputs, PipelineReport, PipelineStats, RenderedDiagram,
    SkippedDocument,
};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
pub use run::{check_tools, run, run_sync};
pub use tool::{Invocation, SystemRunner, ToolOutput, ToolRunner};
