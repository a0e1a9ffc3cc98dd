//! Configuration types for a documentation-bundle run.
//!
//! Every input location, the output root, and the external tool names live
//! in [`PipelineConfig`], built via its [`PipelineConfigBuilder`]. The
//! defaults describe the fixed project layout, so a plain
//! `PipelineConfig::default()` run needs no flags or environment at all.

use crate::error::DocBundleError;
use crate::progress::ProgressCallback;
use crate::tool::ToolRunner;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Configuration for one pipeline run.
///
/// All relative paths are resolved against `project_root`.
///
/// # Example
/// ```rust
/// use docbundle::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .project_root("/srv/dlms-cosem")
///     .output_root("target/docs")
///     .clean_output(false)
///     .build()
///     .unwrap();
/// assert!(config.workspace().index_path().ends_with("target/docs/documents/index.md"));
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Directory every other relative path is resolved against. Default: `.`.
    pub project_root: PathBuf,

    /// Source tree handed to the API-comment extractor. Default: `src`.
    pub source_dir: PathBuf,

    /// Extractor configuration file. Default: `Doxyfile`.
    pub doxyfile: PathBuf,

    /// Directory holding diagram-description files. Default: `docs/diagrams`.
    pub diagrams_dir: PathBuf,

    /// Extension (without dot) of diagram-description files. Default: `puml`.
    pub diagram_extension: String,

    /// The narrative Markdown document. Default: `README.md`.
    pub narrative: PathBuf,

    /// Directory of externally sourced reference PDFs. Default: `docs/references`.
    pub references_dir: PathBuf,

    /// Root of everything the pipeline writes. Default: `docs/output`.
    pub output_root: PathBuf,

    /// Remove the output root before the run so no stale artefacts survive.
    /// Default: true.
    pub clean_output: bool,

    /// Executable names for every external role.
    pub tools: ToolSet,

    /// Search path used by the dependency check instead of `$PATH`.
    pub search_path: Option<OsString>,

    /// Pre-constructed tool runner. If None, uses [`crate::tool::SystemRunner`].
    pub runner: Option<Arc<dyn ToolRunner>>,

    /// Optional stage/document event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            source_dir: PathBuf::from("src"),
            doxyfile: PathBuf::from("Doxyfile"),
            diagrams_dir: PathBuf::from("docs/diagrams"),
            diagram_extension: "puml".to_string(),
            narrative: PathBuf::from("README.md"),
            references_dir: PathBuf::from("docs/references"),
            output_root: PathBuf::from("docs/output"),
            clean_output: true,
            tools: ToolSet::default(),
            search_path: None,
            runner: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("project_root", &self.project_root)
            .field("source_dir", &self.source_dir)
            .field("doxyfile", &self.doxyfile)
            .field("diagrams_dir", &self.diagrams_dir)
            .field("diagram_extension", &self.diagram_extension)
            .field("narrative", &self.narrative)
            .field("references_dir", &self.references_dir)
            .field("output_root", &self.output_root)
            .field("clean_output", &self.clean_output)
            .field("tools", &self.tools)
            .field("search_path", &self.search_path)
            .field("runner", &self.runner.as_ref().map(|_| "<dyn ToolRunner>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source_dir)
    }

    pub fn doxyfile_path(&self) -> PathBuf {
        self.resolve(&self.doxyfile)
    }

    pub fn diagrams_path(&self) -> PathBuf {
        self.resolve(&self.diagrams_dir)
    }

    pub fn narrative_path(&self) -> PathBuf {
        self.resolve(&self.narrative)
    }

    pub fn references_path(&self) -> PathBuf {
        self.resolve(&self.references_dir)
    }

    /// The output directory tree this config writes into.
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.resolve(&self.output_root))
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn project_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.project_root = dir.into();
        self
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn doxyfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.doxyfile = path.into();
        self
    }

    pub fn diagrams_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.diagrams_dir = dir.into();
        self
    }

    pub fn diagram_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.diagram_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn narrative(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.narrative = path.into();
        self
    }

    pub fn references_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.references_dir = dir.into();
        self
    }

    pub fn output_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_root = dir.into();
        self
    }

    pub fn clean_output(mut self, v: bool) -> Self {
        self.config.clean_output = v;
        self
    }

    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn search_path(mut self, path: impl Into<OsString>) -> Self {
        self.config.search_path = Some(path.into());
        self
    }

    pub fn runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.config.runner = Some(runner);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocBundleError> {
        let c = &self.config;
        if c.output_root.as_os_str().is_empty() {
            return Err(DocBundleError::InvalidConfig(
                "output root must not be empty".into(),
            ));
        }
        // The clearing variant deletes the output root recursively.
        if c.clean_output {
            let output = normalise(&c.resolve(&c.output_root))?;
            let project = normalise(&c.project_root)?;
            if project.starts_with(&output) {
                return Err(DocBundleError::InvalidConfig(format!(
                    "output root '{}' contains the project root; clearing it would remove the project",
                    c.output_root.display()
                )));
            }
        }
        if c.diagram_extension.is_empty() {
            return Err(DocBundleError::InvalidConfig(
                "diagram extension must not be empty".into(),
            ));
        }
        if let Some((role, _)) = c.tools.roles().into_iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(DocBundleError::InvalidConfig(format!(
                "tool name for {role} must not be empty"
            )));
        }
        Ok(self.config)
    }
}

/// Absolute form of `path` with `.` and `..` folded away lexically.
fn normalise(path: &Path) -> Result<PathBuf, DocBundleError> {
    let absolute = std::path::absolute(path).map_err(|e| {
        DocBundleError::InvalidConfig(format!("cannot resolve '{}': {e}", path.display()))
    })?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

// ── Tools ────────────────────────────────────────────────────────────────

/// Executable names for each external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSet {
    /// API-comment extractor.
    pub doxygen: String,
    /// Diagram renderer.
    pub plantuml: String,
    /// Document converter.
    pub pandoc: String,
    /// HTML-rendering PDF engine used by the document converter.
    pub pdf_engine: String,
    /// PDF-to-HTML extractor.
    pub pdftohtml: String,
    /// PDF page rasterizer.
    pub pdftoppm: String,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            doxygen: "doxygen".to_string(),
            plantuml: "plantuml".to_string(),
            pandoc: "pandoc".to_string(),
            pdf_engine: "wkhtmltopdf".to_string(),
            pdftohtml: "pdftohtml".to_string(),
            pdftoppm: "pdftoppm".to_string(),
        }
    }
}

impl ToolSet {
    /// `(role, executable)` pairs, in the order the dependency check runs.
    pub fn roles(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("API extractor", self.doxygen.as_str()),
            ("diagram renderer", self.plantuml.as_str()),
            ("document converter", self.pandoc.as_str()),
            ("PDF engine", self.pdf_engine.as_str()),
            ("PDF-to-HTML extractor", self.pdftohtml.as_str()),
            ("PDF rasterizer", self.pdftoppm.as_str()),
        ]
    }

    /// Executable names that must resolve before any work begins.
    pub fn required(&self) -> Vec<&str> {
        self.roles().into_iter().map(|(_, name)| name).collect()
    }
}

// ── Workspace ────────────────────────────────────────────────────────────

/// Output directory layout under one root.
///
/// ```text
/// <root>/
///   api/              API reference (extractor-owned)
///   diagrams/         <stem>.svg + <stem>.pdf
///   documents/        narrative HTML/PDF + index.md
///     pdf/            <safe>.md + <safe>_figures/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn api_dir(&self) -> PathBuf {
        self.root.join("api")
    }

    pub fn diagrams_dir(&self) -> PathBuf {
        self.root.join("diagrams")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    pub fn pdf_documents_dir(&self) -> PathBuf {
        self.documents_dir().join("pdf")
    }

    pub fn index_path(&self) -> PathBuf {
        self.documents_dir().join("index.md")
    }
}
