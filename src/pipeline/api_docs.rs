//! API reference: one doxygen run over the source tree.
//!
//! The project's Doxyfile is fed on stdin (`doxygen -`) with two trailing
//! overrides, so the input tree and output directory always follow the
//! pipeline config regardless of what the Doxyfile says. Later assignments
//! win in doxygen's config format.

use crate::config::{PipelineConfig, Workspace};
use crate::error::DocBundleError;
use crate::progress::Stage;
use crate::tool::{run_checked, Invocation, ToolRunner};
use std::path::Path;
use tracing::info;

/// Run the API-comment extractor, writing beneath `<output>/api`.
pub async fn generate_api_reference(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    workspace: &Workspace,
) -> Result<(), DocBundleError> {
    let doxyfile = config.doxyfile_path();
    let base = tokio::fs::read_to_string(&doxyfile)
        .await
        .map_err(|e| DocBundleError::Io {
            path: doxyfile.clone(),
            source: e,
        })?;

    let source = absolute(&config.source_path())?;
    let api_dir = absolute(&workspace.api_dir())?;
    let doxyfile_text = with_overrides(&base, &source, &api_dir);

    let invocation = Invocation::new(&config.tools.doxygen)
        .arg("-")
        .stdin(doxyfile_text)
        .current_dir(&config.project_root);
    run_checked(runner, Stage::ApiReference, &invocation).await?;

    info!("API reference written to {}", api_dir.display());
    Ok(())
}

/// Append `INPUT` and `OUTPUT_DIRECTORY` assignments to a Doxyfile body.
pub fn with_overrides(base: &str, source: &Path, output: &Path) -> String {
    let mut text = String::with_capacity(base.len() + 128);
    text.push_str(base);
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&format!("INPUT = {}\n", quote(source)));
    text.push_str(&format!("OUTPUT_DIRECTORY = {}\n", quote(output)));
    text
}

fn quote(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

pub(crate) fn absolute(path: &Path) -> Result<std::path::PathBuf, DocBundleError> {
    std::path::absolute(path).map_err(|e| DocBundleError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_are_appended_last() {
        let text = with_overrides(
            "PROJECT_NAME = dlms\nOUTPUT_DIRECTORY = old",
            Path::new("/p/src"),
            Path::new("/p/docs/output/api"),
        );
        assert_eq!(
            text,
            "PROJECT_NAME = dlms\nOUTPUT_DIRECTORY = old\n\
             INPUT = \"/p/src\"\n\
             OUTPUT_DIRECTORY = \"/p/docs/output/api\"\n"
        );
    }

    #[test]
    fn empty_doxyfile_still_gets_overrides() {
        let text = with_overrides("", Path::new("/s"), Path::new("/o"));
        assert_eq!(text, "INPUT = \"/s\"\nOUTPUT_DIRECTORY = \"/o\"\n");
    }
}
