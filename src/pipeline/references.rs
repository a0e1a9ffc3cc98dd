//! Reference documents: every PDF → GFM Markdown plus one PNG per page.
//!
//! ## Per-document flow
//!
//! ```text
//! A B.pdf ──pdftohtml──▶ <tmp>/extract.html ──pandoc──▶ pdf/A_B.md
//!        └──pdftoppm──▶ pdf/A_B_figures/page_1.png, page_2.png, …
//! ```
//!
//! The HTML extraction lives in a [`TempDir`] owned by the per-document
//! function, so it is removed on every exit path: success, skip, or a fatal
//! error propagating out.
//!
//! ## Failure policy
//!
//! Reference PDFs come from outside the project and may be malformed. When
//! extraction yields no HTML the document is skipped with a warning and the
//! batch continues. Once extraction has succeeded, conversion and
//! rasterisation failures are treated like any other tool failure and abort
//! the run.

use crate::config::{PipelineConfig, Workspace};
use crate::error::{DocBundleError, DocumentError};
use crate::output::{figures_dir_name, ConvertedDocument, SkippedDocument};
use crate::pipeline::diagrams::{has_extension, list_files};
use crate::pipeline::postprocess;
use crate::progress::{ProgressCallback, Stage};
use crate::tool::{run_checked, Invocation, ToolRunner};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Base name given to the extractor inside the temp directory.
const EXTRACT_STEM: &str = "extract";

/// Prefix handed to the rasterizer; it appends `-<page>.png`.
const RASTER_PREFIX: &str = "page";

/// Result of the whole reference stage.
#[derive(Debug, Default)]
pub struct ReferenceOutcome {
    /// Converted documents, in discovery order.
    pub converted: Vec<ConvertedDocument>,
    /// Skipped documents, in discovery order.
    pub skipped: Vec<SkippedDocument>,
}

/// What happened to one PDF.
#[derive(Debug)]
pub enum DocumentOutcome {
    Converted(ConvertedDocument),
    Skipped(SkippedDocument),
}

/// Convert every PDF in the references directory, in file-name order.
pub async fn convert_references(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    workspace: &Workspace,
    progress: Option<&ProgressCallback>,
) -> Result<ReferenceOutcome, DocBundleError> {
    let pdfs = discover_pdfs(&config.references_path()).await?;
    let mut outcome = ReferenceOutcome::default();
    if pdfs.is_empty() {
        info!(
            "No reference PDFs in {}",
            config.references_path().display()
        );
        return Ok(outcome);
    }

    info!("Converting {} reference PDF(s)", pdfs.len());
    let mut seen = HashSet::new();
    for pdf in &pdfs {
        let shown = display_name(pdf);
        let safe = safe_name(&shown);
        // Distinct names can normalise to the same stem; the later one wins.
        if !seen.insert(safe.clone()) {
            warn!(
                "'{}' maps to '{}' like an earlier document; its output will be overwritten",
                shown, safe
            );
        }

        match convert_document(runner, config, workspace, pdf, shown, safe).await? {
            DocumentOutcome::Converted(doc) => {
                if let Some(cb) = progress {
                    cb.on_document_converted(&doc.display_name, doc.pages);
                }
                outcome.converted.push(doc);
            }
            DocumentOutcome::Skipped(skipped) => {
                warn!("{}", skipped.error);
                if let Some(cb) = progress {
                    cb.on_document_skipped(&skipped.display_name, &skipped.error.to_string());
                }
                outcome.skipped.push(skipped);
            }
        }
    }

    info!(
        "Reference documents: {} converted, {} skipped",
        outcome.converted.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

/// Convert a single PDF.
///
/// `Ok(Skipped)` when extraction produced nothing; `Err` for fatal failures
/// after a successful extraction.
pub async fn convert_document(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    workspace: &Workspace,
    pdf: &Path,
    display_name: String,
    safe_name: String,
) -> Result<DocumentOutcome, DocBundleError> {
    debug!("Converting reference '{}' ({})", display_name, pdf.display());

    // ── Step 1: Extract to a scoped temp dir ─────────────────────────────
    let scratch = TempDir::new().map_err(|e| DocBundleError::Internal(format!("tempfile: {e}")))?;
    let Some(html) = extract_html(runner, config, pdf, scratch.path()).await else {
        return Ok(DocumentOutcome::Skipped(SkippedDocument {
            error: DocumentError::NoHtmlOutput {
                document: display_name.clone(),
            },
            display_name,
        }));
    };

    // ── Step 2: HTML → GFM ───────────────────────────────────────────────
    let out_dir = workspace.pdf_documents_dir();
    let markdown_path = out_dir.join(format!("{safe_name}.md"));
    let to_markdown = Invocation::new(&config.tools.pandoc)
        .arg(&html)
        .args(["-f", "html", "-t", "gfm", "-o"])
        .arg(&markdown_path);
    run_checked(runner, Stage::References, &to_markdown).await?;
    drop(scratch);

    // ── Step 3: Rasterise pages ──────────────────────────────────────────
    let figures = out_dir.join(figures_dir_name(&safe_name));
    reset_dir(&figures).await?;
    let rasterise = Invocation::new(&config.tools.pdftoppm)
        .arg("-png")
        .arg(pdf)
        .arg(figures.join(RASTER_PREFIX));
    run_checked(runner, Stage::References, &rasterise).await?;
    let pages = normalise_page_images(&figures).await?;

    // ── Step 4: Clean up and append figures ──────────────────────────────
    let raw = tokio::fs::read_to_string(&markdown_path)
        .await
        .map_err(|e| DocBundleError::Io {
            path: markdown_path.clone(),
            source: e,
        })?;
    let mut markdown = postprocess::clean_markdown(&raw);
    markdown.push_str(&figures_section(&display_name, &safe_name, &pages));
    tokio::fs::write(&markdown_path, markdown)
        .await
        .map_err(|e| DocBundleError::OutputWriteFailed {
            path: markdown_path.clone(),
            source: e,
        })?;

    info!(
        "Converted '{}' → {} ({} page image(s))",
        display_name,
        markdown_path.display(),
        pages.len()
    );
    Ok(DocumentOutcome::Converted(ConvertedDocument {
        display_name,
        safe_name,
        pages: pages.len(),
    }))
}

/// Run the extractor and return the HTML path if it produced a non-empty file.
async fn extract_html(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    pdf: &Path,
    scratch: &Path,
) -> Option<PathBuf> {
    let invocation = Invocation::new(&config.tools.pdftohtml)
        .args(["-s", "-i", "-noframes", "-q"])
        .arg(pdf)
        .arg(scratch.join(EXTRACT_STEM));
    debug!(stage = %Stage::References, "exec: {}", invocation);

    // Only the presence of output decides; the exit status is informational.
    match runner.run(&invocation).await {
        Ok(out) if !out.success => warn!(
            "'{}' exited with {:?} for {}",
            invocation.program,
            out.status,
            pdf.display()
        ),
        Ok(_) => {}
        Err(e) => warn!("Failed to launch '{}': {}", invocation.program, e),
    }

    find_extracted_html(scratch).await
}

/// `extract.html` if present, otherwise the first `.html` file; empty files
/// do not count.
async fn find_extracted_html(scratch: &Path) -> Option<PathBuf> {
    let preferred = scratch.join(format!("{EXTRACT_STEM}.html"));
    let mut candidates = vec![preferred];
    if let Ok(others) = list_files(scratch, |p| has_extension(p, "html")).await {
        candidates.extend(others);
    }

    for candidate in candidates {
        if let Ok(meta) = tokio::fs::metadata(&candidate).await {
            if meta.is_file() && meta.len() > 0 {
                return Some(candidate);
            }
        }
    }
    None
}

/// Remove and recreate a directory so it holds only this run's files.
async fn reset_dir(dir: &Path) -> Result<(), DocBundleError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(DocBundleError::Io {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DocBundleError::Io {
            path: dir.to_path_buf(),
            source: e,
        })
}

// ── Discovery & naming ───────────────────────────────────────────────────

/// `*.pdf` files (any extension case) in `dir`, sorted by file name.
///
/// A missing directory is an empty set.
pub async fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, DocBundleError> {
    list_files(dir, |p| has_extension(p, "pdf")).await
}

/// File name without extension.
pub fn display_name(pdf: &Path) -> String {
    pdf.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display name with every space replaced by an underscore.
pub fn safe_name(display_name: &str) -> String {
    display_name.replace(' ', "_")
}

// ── Page images ──────────────────────────────────────────────────────────

// pdftoppm pads page numbers to the width of the page count.
static RE_RASTER_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page-0*(\d+)\.png$").unwrap());

static RE_PAGE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^page_(\d+)\.png$").unwrap());

/// Rename `page-01.png`-style rasterizer output to `page_1.png` and return
/// the page numbers present, ascending.
pub async fn normalise_page_images(dir: &Path) -> Result<Vec<usize>, DocBundleError> {
    let files = list_files(dir, |p| has_extension(p, "png")).await?;
    for file in &files {
        let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if let Some(caps) = RE_RASTER_PAGE.captures(&name) {
            let target = dir.join(format!("page_{}.png", &caps[1]));
            tokio::fs::rename(file, &target)
                .await
                .map_err(|e| DocBundleError::Io {
                    path: file.clone(),
                    source: e,
                })?;
        }
    }

    let mut pages: Vec<usize> = list_files(dir, |p| has_extension(p, "png"))
        .await?
        .iter()
        .filter_map(|p| p.file_name())
        .filter_map(|n| {
            RE_PAGE_IMAGE
                .captures(&n.to_string_lossy())
                .and_then(|c| c[1].parse().ok())
        })
        .collect();
    pages.sort_unstable();
    Ok(pages)
}

/// The `## Figures` block appended to a converted document, or an empty
/// string when there are no page images.
pub fn figures_section(display_name: &str, safe_name: &str, pages: &[usize]) -> String {
    if pages.is_empty() {
        return String::new();
    }
    let figures = figures_dir_name(safe_name);
    let mut out = String::from("\n## Figures\n");
    for page in pages {
        out.push_str(&format!(
            "\n![{} page {}]({})\n",
            link_text(display_name),
            page,
            link_target(&format!("{figures}/page_{page}.png"))
        ));
    }
    out
}

/// Markdown link or image text with the bracket and escape characters escaped.
pub(crate) fn link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Markdown link destination, wrapped in `<>` when it would otherwise break.
pub(crate) fn link_target(path: &str) -> String {
    if path.contains([' ', '(', ')']) {
        format!("<{path}>")
    } else {
        path.to_string()
    }
}
