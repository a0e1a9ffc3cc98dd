//! Error types for the docbundle library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocBundleError`] — **Fatal**: the run cannot continue (a required tool
//!   is missing, the workspace cannot be created, a tool on maintainer-owned
//!   input failed). Returned as `Err(DocBundleError)` from [`crate::run()`].
//!
//! * [`DocumentError`] — **Non-fatal**: a single reference PDF could not be
//!   extracted. Stored inside [`crate::output::SkippedDocument`] so the run
//!   still finishes with every processable document converted.

use std::path::PathBuf;
use thiserror::Error;

use crate::progress::Stage;

/// All fatal errors returned by the docbundle library.
///
/// Per-document reference failures use [`DocumentError`] and are recorded in
/// the run report rather than propagated here.
#[derive(Debug, Error)]
pub enum DocBundleError {
    // ── Preconditions ─────────────────────────────────────────────────────
    /// A required external tool does not resolve on the search path.
    #[error("Required tool '{tool}' was not found on PATH.\nInstall it or adjust PATH, then re-run.")]
    MissingTool { tool: String },

    // ── Workspace errors ──────────────────────────────────────────────────
    /// The output directory tree could not be cleared or created.
    #[error("Failed to prepare output workspace '{path}': {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The tool could not be started at all.
    #[error("Failed to launch '{tool}': {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but reported failure.
    #[error("{stage}: '{tool}' exited with {}{}", describe_status(.status), describe_stderr(.stderr))]
    ToolFailed {
        tool: String,
        stage: Stage,
        status: Option<i32>,
        stderr: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading an input or inspecting the output tree failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a generated file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

/// A non-fatal error for a single reference document.
///
/// The document is skipped; every other document is still converted and the
/// run exits successfully.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The PDF-to-HTML extractor produced no (or an empty) HTML file.
    #[error("'{document}': PDF-to-HTML extraction produced no output, skipping")]
    NoHtmlOutput { document: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_names_the_tool() {
        let e = DocBundleError::MissingTool {
            tool: "plantuml".into(),
        };
        assert!(e.to_string().contains("'plantuml'"), "got: {e}");
    }

    #[test]
    fn tool_failed_display_with_stderr() {
        let e = DocBundleError::ToolFailed {
            tool: "pandoc".into(),
            stage: Stage::Narrative,
            status: Some(64),
            stderr: "  unknown reader  \n".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("pandoc"), "got: {msg}");
        assert!(msg.contains("status 64"), "got: {msg}");
        assert!(msg.ends_with("\nunknown reader"), "got: {msg}");
    }

    #[test]
    fn tool_failed_display_for_signal() {
        let e = DocBundleError::ToolFailed {
            tool: "doxygen".into(),
            stage: Stage::ApiReference,
            status: None,
            stderr: String::new(),
        };
        let msg = e.to_string();
        assert!(msg.contains("terminated by signal"), "got: {msg}");
        assert!(!msg.contains('\n'), "got: {msg}");
    }

    #[test]
    fn document_error_names_the_document() {
        let e = DocumentError::NoHtmlOutput {
            document: "Blue Book".into(),
        };
        assert!(e.to_string().contains("'Blue Book'"));
    }
}
