//! Narrative document: README → standalone HTML and → PDF via an HTML engine.

use crate::config::{PipelineConfig, Workspace};
use crate::error::DocBundleError;
use crate::output::NarrativeOutputs;
use crate::progress::Stage;
use crate::tool::{run_checked, Invocation, ToolRunner};
use tracing::info;

/// Convert the narrative document into the documents directory.
///
/// Both conversions must succeed; either failing aborts the run.
pub async fn convert_narrative(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    workspace: &Workspace,
) -> Result<NarrativeOutputs, DocBundleError> {
    let source = config.narrative_path();
    if !source.is_file() {
        return Err(DocBundleError::Io {
            path: source,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "narrative document not found",
            ),
        });
    }

    let outputs = NarrativeOutputs::for_stem(&narrative_stem(config));
    let html = workspace.documents_dir().join(&outputs.html);
    let pdf = workspace.documents_dir().join(&outputs.pdf);

    let to_html = Invocation::new(&config.tools.pandoc)
        .arg(&source)
        .args(["-f", "markdown", "-t", "html", "-s", "-o"])
        .arg(&html);
    run_checked(runner, Stage::Narrative, &to_html).await?;

    let to_pdf = Invocation::new(&config.tools.pandoc)
        .arg(&source)
        .args(["-f", "markdown", "-t", "html"])
        .arg(format!("--pdf-engine={}", config.tools.pdf_engine))
        .arg("-o")
        .arg(&pdf);
    run_checked(runner, Stage::Narrative, &to_pdf).await?;

    info!("Narrative converted: {} + {}", outputs.html, outputs.pdf);
    Ok(outputs)
}

/// Stem shared by the narrative outputs (`README` for `README.md`).
pub fn narrative_stem(config: &PipelineConfig) -> String {
    config
        .narrative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "README".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_follows_narrative_file() {
        let c = PipelineConfig::default();
        assert_eq!(narrative_stem(&c), "README");

        let c = PipelineConfig::builder()
            .narrative("docs/OVERVIEW.markdown")
            .build()
            .unwrap();
        assert_eq!(narrative_stem(&c), "OVERVIEW");
    }
}
