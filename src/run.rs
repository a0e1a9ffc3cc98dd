//! Pipeline entry points.
//!
//! [`run`] executes every stage in order and returns a [`PipelineReport`].
//! Any fatal error stops the run at that stage; skipped reference documents
//! are recorded in the report and do not affect the result.

use crate::config::PipelineConfig;
use crate::error::DocBundleError;
use crate::output::{PipelineReport, PipelineStats};
use crate::pipeline::{api_docs, diagrams, index, narrative, references, verify, workspace};
use crate::progress::Stage;
use crate::tool::{SystemRunner, ToolRunner};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Build the documentation bundle described by `config`.
///
/// # Errors
/// Returns `Err(DocBundleError)` for fatal errors only:
/// - a required tool is missing (nothing is written in that case)
/// - the workspace cannot be prepared
/// - the API extractor, diagram renderer, or narrative conversion fails
/// - converting or rasterising a reference PDF fails after its extraction
///   succeeded
///
/// A reference PDF whose extraction yields no HTML is skipped and listed in
/// [`PipelineReport::skipped`].
pub async fn run(config: &PipelineConfig) -> Result<PipelineReport, DocBundleError> {
    let total_start = Instant::now();
    let runner: Arc<dyn ToolRunner> = config
        .runner
        .clone()
        .unwrap_or_else(|| Arc::new(SystemRunner));
    let runner = runner.as_ref();
    let progress = config.progress_callback.as_ref();
    let ws = config.workspace();
    let mut stats = PipelineStats::default();

    if let Some(cb) = progress {
        cb.on_run_start(Stage::ALL.len());
    }
    info!("Building documentation bundle into {}", ws.root().display());

    // ── Stage 1: Verify tools ────────────────────────────────────────────
    timed(config, &mut stats, Stage::VerifyTools, async {
        verify::verify_tools(&config.tools.required(), config.search_path.as_deref()).map(|_| ())
    })
    .await?;

    // ── Stage 2: Prepare workspace ───────────────────────────────────────
    timed(
        config,
        &mut stats,
        Stage::Workspace,
        workspace::prepare_workspace(&ws, config.clean_output),
    )
    .await?;

    // ── Stage 3: API reference ───────────────────────────────────────────
    timed(
        config,
        &mut stats,
        Stage::ApiReference,
        api_docs::generate_api_reference(runner, config, &ws),
    )
    .await?;

    // ── Stage 4: Diagrams ────────────────────────────────────────────────
    let rendered = timed(
        config,
        &mut stats,
        Stage::Diagrams,
        diagrams::render_diagrams(runner, config, &ws),
    )
    .await?;

    // ── Stage 5: Narrative ───────────────────────────────────────────────
    let narrative_outputs = timed(
        config,
        &mut stats,
        Stage::Narrative,
        narrative::convert_narrative(runner, config, &ws),
    )
    .await?;

    // ── Stage 6: Reference documents ─────────────────────────────────────
    let refs = timed(
        config,
        &mut stats,
        Stage::References,
        references::convert_references(runner, config, &ws, progress),
    )
    .await?;

    // ── Stage 7: Index ───────────────────────────────────────────────────
    let index_path = ws.index_path();
    timed(
        config,
        &mut stats,
        Stage::Index,
        index::write_index(&index_path, &narrative_outputs, &refs.converted, &rendered),
    )
    .await?;

    stats.diagrams_rendered = rendered.len();
    stats.documents_converted = refs.converted.len();
    stats.documents_skipped = refs.skipped.len();
    stats.pages_rasterised = refs.converted.iter().map(|d| d.pages).sum();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Bundle complete: {} diagram(s), {} document(s), {} skipped, {}ms",
        stats.diagrams_rendered,
        stats.documents_converted,
        stats.documents_skipped,
        stats.total_duration_ms
    );
    if let Some(cb) = progress {
        cb.on_run_complete(&stats);
    }

    Ok(PipelineReport {
        output_root: ws.root().to_path_buf(),
        index_path,
        narrative: narrative_outputs,
        diagrams: rendered,
        documents: refs.converted,
        skipped: refs.skipped,
        stats,
    })
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(config: &PipelineConfig) -> Result<PipelineReport, DocBundleError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocBundleError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(config))
}

/// Where every required tool resolves, without running anything.
pub fn check_tools(config: &PipelineConfig) -> Vec<(String, Option<PathBuf>)> {
    config
        .tools
        .required()
        .into_iter()
        .map(|tool| {
            (
                tool.to_string(),
                verify::resolve_tool(tool, config.search_path.as_deref()),
            )
        })
        .collect()
}

/// Run one stage inside a tracing span, notify the callback, record timing.
async fn timed<T, F>(
    config: &PipelineConfig,
    stats: &mut PipelineStats,
    stage: Stage,
    fut: F,
) -> Result<T, DocBundleError>
where
    F: Future<Output = Result<T, DocBundleError>>,
{
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    let start = Instant::now();
    let span = info_span!("stage", name = stage.label());
    let value = fut.instrument(span).await?;
    stats
        .stage_durations_ms
        .push((stage.label().to_string(), start.elapsed().as_millis() as u64));
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage);
    }
    Ok(value)
}
