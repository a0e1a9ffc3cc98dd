//! Bookkeeping records and the run report.
//!
//! The index builder only links what these records say was produced, so a
//! record is created strictly after its artefact is complete on disk.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A diagram whose vector image exists in the diagrams output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDiagram {
    /// Source file name with the extension stripped; shared stem of the
    /// `.svg` and `.pdf` outputs.
    pub name: String,
}

impl RenderedDiagram {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn svg_file(&self) -> String {
        format!("{}.svg", self.name)
    }

    pub fn pdf_file(&self) -> String {
        format!("{}.pdf", self.name)
    }
}

/// A reference PDF that was fully converted to Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// PDF file name without extension, as shown to readers.
    pub display_name: String,
    /// Display name with spaces replaced by underscores; stem of every output.
    pub safe_name: String,
    /// Number of page images in the figures directory.
    pub pages: usize,
}

impl ConvertedDocument {
    /// `<safe>.md`, relative to the PDF-derived documents directory.
    pub fn markdown_file(&self) -> String {
        format!("{}.md", self.safe_name)
    }

    /// `<safe>_figures`, relative to the PDF-derived documents directory.
    pub fn figures_dir(&self) -> String {
        figures_dir_name(&self.safe_name)
    }
}

pub(crate) fn figures_dir_name(safe_name: &str) -> String {
    format!("{safe_name}_figures")
}

/// A reference PDF that was skipped; the run carried on without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub display_name: String,
    pub error: DocumentError,
}

/// The two narrative outputs, as file names inside the documents directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeOutputs {
    pub html: String,
    pub pdf: String,
}

impl NarrativeOutputs {
    /// Output names derived from the narrative document's stem.
    pub fn for_stem(stem: &str) -> Self {
        Self {
            html: format!("{stem}.html"),
            pdf: format!("{stem}.pdf"),
        }
    }
}

/// Timing and count statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub diagrams_rendered: usize,
    pub documents_converted: usize,
    pub documents_skipped: usize,
    /// Page images produced across all converted documents.
    pub pages_rasterised: usize,
    /// Wall-clock time per stage, in execution order.
    pub stage_durations_ms: Vec<(String, u64)>,
    pub total_duration_ms: u64,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub output_root: PathBuf,
    pub index_path: PathBuf,
    pub narrative: NarrativeOutputs,
    pub diagrams: Vec<RenderedDiagram>,
    pub documents: Vec<ConvertedDocument>,
    pub skipped: Vec<SkippedDocument>,
    pub stats: PipelineStats,
}
