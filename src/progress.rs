//! Progress-callback trait for pipeline stage and document events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages and reference documents.
//! The CLI uses it to drive a terminal spinner; library callers can forward
//! the events anywhere.
//!
//! # Example
//!
//! ```rust
//! use docbundle::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl PipelineProgressCallback for PrintStages {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("-> {stage}");
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(Arc::new(PrintStages))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PipelineStats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VerifyTools,
    Workspace,
    ApiReference,
    Diagrams,
    Narrative,
    References,
    Index,
}

impl Stage {
    /// Every stage in the order [`crate::run()`] executes them.
    pub const ALL: [Stage; 7] = [
        Stage::VerifyTools,
        Stage::Workspace,
        Stage::ApiReference,
        Stage::Diagrams,
        Stage::Narrative,
        Stage::References,
        Stage::Index,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::VerifyTools => "dependency check",
            Stage::Workspace => "output workspace",
            Stage::ApiReference => "API reference",
            Stage::Diagrams => "diagrams",
            Stage::Narrative => "narrative document",
            Stage::References => "reference documents",
            Stage::Index => "index page",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is sequential, so events never overlap,
/// but the trait is `Send + Sync` to live inside an `Arc` in the config.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once before the first stage.
    fn on_run_start(&self, stages: usize) {
        let _ = stages;
    }

    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a reference PDF has been fully converted.
    ///
    /// # Arguments
    /// * `display_name` — file name of the PDF without extension
    /// * `pages`        — number of page images produced
    fn on_document_converted(&self, display_name: &str, pages: usize) {
        let _ = (display_name, pages);
    }

    /// Called when a reference PDF is skipped because extraction failed.
    fn on_document_skipped(&self, display_name: &str, reason: &str) {
        let _ = (display_name, reason);
    }

    /// Called once after the index page has been written.
    fn on_run_complete(&self, stats: &PipelineStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// Equivalent to configuring no callback at all.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<Stage>>,
        converted: AtomicUsize,
        skipped: AtomicUsize,
    }

    impl PipelineProgressCallback for TrackingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_document_converted(&self, _display_name: &str, _pages: usize) {
            self.converted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_skipped(&self, _display_name: &str, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(7);
        cb.on_stage_start(Stage::Diagrams);
        cb.on_stage_complete(Stage::Diagrams);
        cb.on_document_converted("Blue Book", 3);
        cb.on_document_skipped("Broken", "no output");
        cb.on_run_complete(&PipelineStats::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_stage_start(Stage::VerifyTools);
        tracker.on_stage_start(Stage::References);
        tracker.on_document_converted("A B", 2);
        tracker.on_document_skipped("C", "no output");
        tracker.on_document_converted("D", 1);

        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec![Stage::VerifyTools, Stage::References]
        );
        assert_eq!(tracker.converted.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stages_are_listed_in_execution_order() {
        assert_eq!(Stage::ALL.first(), Some(&Stage::VerifyTools));
        assert_eq!(Stage::ALL.last(), Some(&Stage::Index));
        assert_eq!(Stage::References.to_string(), "reference documents");
    }
}
