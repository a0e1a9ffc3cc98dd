//! Diagram rendering: every description file → `<stem>.svg` + `<stem>.pdf`.
//!
//! The renderer is invoked once per output format over the whole file set.
//! A renderer failure aborts the run; there is no per-diagram recovery. What
//! gets recorded afterwards is read back from the output directory, so a
//! diagram only reaches the index if its SVG actually exists.

use crate::config::{PipelineConfig, Workspace};
use crate::error::DocBundleError;
use crate::output::RenderedDiagram;
use crate::pipeline::api_docs::absolute;
use crate::progress::Stage;
use crate::tool::{run_checked, Invocation, ToolRunner};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output formats requested from the renderer, in invocation order.
pub const FORMATS: [&str; 2] = ["svg", "pdf"];

/// Render all diagrams and return the ones whose SVG is present, sorted by name.
pub async fn render_diagrams(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    workspace: &Workspace,
) -> Result<Vec<RenderedDiagram>, DocBundleError> {
    let sources = discover_diagrams(&config.diagrams_path(), &config.diagram_extension).await?;
    if sources.is_empty() {
        info!(
            "No .{} files in {}; skipping diagram rendering",
            config.diagram_extension,
            config.diagrams_path().display()
        );
        return Ok(Vec::new());
    }

    info!("Rendering {} diagram(s)", sources.len());
    let out_dir = absolute(&workspace.diagrams_dir())?;
    for format in FORMATS {
        let invocation = Invocation::new(&config.tools.plantuml)
            .arg(format!("-t{format}"))
            .arg("-o")
            .arg(&out_dir)
            .args(&sources);
        run_checked(runner, Stage::Diagrams, &invocation).await?;
    }

    let rendered = collect_rendered(&out_dir).await?;
    info!("{} diagram(s) rendered", rendered.len());
    Ok(rendered)
}

/// Regular files in `dir` with extension `ext`, sorted by file name.
///
/// A missing directory is an empty set.
pub async fn discover_diagrams(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, DocBundleError> {
    list_files(dir, |p| has_extension(p, ext)).await
}

/// Stems of the `.svg` files in `dir`, sorted.
pub async fn collect_rendered(dir: &Path) -> Result<Vec<RenderedDiagram>, DocBundleError> {
    let svgs = list_files(dir, |p| has_extension(p, "svg")).await?;
    Ok(svgs
        .iter()
        .filter_map(|p| p.file_stem())
        .map(|stem| {
            let name = stem.to_string_lossy().into_owned();
            debug!("rendered diagram: {}", name);
            RenderedDiagram::new(name)
        })
        .collect())
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// List regular files in `dir` accepted by `keep`, sorted by file name.
pub(crate) async fn list_files(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, DocBundleError> {
    let io_err = |e| DocBundleError::Io {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        let is_file = entry.file_type().await.map_err(io_err)?.is_file();
        if is_file && keep(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn discovery_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.puml", "a.puml", "notes.txt", "C.PUML"] {
            std::fs::write(tmp.path().join(name), "@startuml\n@enduml\n").unwrap();
        }
        std::fs::create_dir(tmp.path().join("dir.puml")).unwrap();

        let found = discover_diagrams(tmp.path(), "puml").await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["C.PUML", "a.puml", "b.puml"]);
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let found = discover_diagrams(&tmp.path().join("nope"), "puml")
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn only_present_svgs_are_recorded() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("server_flow.svg"), "<svg/>").unwrap();
        std::fs::write(tmp.path().join("server_flow.pdf"), "%PDF").unwrap();
        std::fs::write(tmp.path().join("client_flow.pdf"), "%PDF").unwrap();
        std::fs::write(tmp.path().join("association.svg"), "<svg/>").unwrap();

        let rendered = collect_rendered(tmp.path()).await.unwrap();
        assert_eq!(
            rendered,
            vec![
                RenderedDiagram::new("association"),
                RenderedDiagram::new("server_flow")
            ]
        );
    }
}
