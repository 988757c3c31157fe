//! Progress reporting for the pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] at the start and end of every
//! stage. Callers plug in a [`ProgressReporter`] (or a closure through
//! [`ClosureProgressReporter`]) to log or display them.
//!
//! # Example
//!
//! ```rust,ignore
//! use mobility_processing::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of the pipeline.
///
/// The first five stages each produce one snapshot, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Synthesizing the clean dataset
    Generation,
    /// Marking random cells as missing
    NullInjection,
    /// Filling missing values with median / mode
    Imputation,
    /// Multiplying random distances
    OutlierInjection,
    /// Clamping distances into the IQR bounds
    OutlierCapping,
    /// Writing the JSON report
    ReportGeneration,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// The five snapshot-producing stages, in execution order.
    pub const SNAPSHOT_STAGES: [PipelineStage; 5] = [
        Self::Generation,
        Self::NullInjection,
        Self::Imputation,
        Self::OutlierInjection,
        Self::OutlierCapping,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Generation => "Generating Trips",
            Self::NullInjection => "Injecting Nulls",
            Self::Imputation => "Imputing Values",
            Self::OutlierInjection => "Injecting Outliers",
            Self::OutlierCapping => "Capping Outliers",
            Self::ReportGeneration => "Generating Report",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// 1-based number of the snapshot this stage writes.
    pub fn snapshot_number(&self) -> Option<u8> {
        match self {
            Self::Generation => Some(1),
            Self::NullInjection => Some(2),
            Self::Imputation => Some(3),
            Self::OutlierInjection => Some(4),
            Self::OutlierCapping => Some(5),
            _ => None,
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Generation => 0.25,
            Self::NullInjection => 0.15,
            Self::Imputation => 0.20,
            Self::OutlierInjection => 0.15,
            Self::OutlierCapping => 0.15,
            Self::ReportGeneration => 0.10,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Generation => 0.0,
            Self::NullInjection => 0.25,
            Self::Imputation => 0.40,
            Self::OutlierInjection => 0.60,
            Self::OutlierCapping => 0.75,
            Self::ReportGeneration => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Trait for receiving progress updates during a run.
///
/// Implementations must be `Send + Sync` so that a configured pipeline can be
/// moved to another thread.
pub trait ProgressReporter: Send + Sync {
    /// Called at the start and end of every stage.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_snapshot_numbers_follow_execution_order() {
        let numbers: Vec<u8> = PipelineStage::SNAPSHOT_STAGES
            .iter()
            .filter_map(|s| s.snapshot_number())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(PipelineStage::ReportGeneration.snapshot_number(), None);
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        let stages = [
            PipelineStage::Generation,
            PipelineStage::NullInjection,
            PipelineStage::Imputation,
            PipelineStage::OutlierInjection,
            PipelineStage::OutlierCapping,
            PipelineStage::ReportGeneration,
        ];
        for pair in stages.windows(2) {
            let expected = pair[0].base_progress() + pair[0].weight();
            assert!((pair[1].base_progress() - expected).abs() < 1e-6);
        }
        let last = stages[stages.len() - 1];
        assert!((last.base_progress() + last.weight() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::Imputation, 0.5, "halfway");
        assert!((update.progress - 0.50).abs() < 1e-6);
        assert_eq!(update.stage_progress, 0.5);
        assert_eq!(update.message, "halfway");
    }

    #[test]
    fn test_progress_update_clamps() {
        let update = ProgressUpdate::new(PipelineStage::OutlierCapping, 5.0, "overflow");
        assert!(update.progress <= 1.0);
        assert_eq!(update.stage_progress, 1.0);
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ClosureProgressReporter::new(move |update: ProgressUpdate| {
            sink.lock().push(update.stage);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Generation, 0.0, "start"));
        reporter.report(ProgressUpdate::complete("done"));

        assert_eq!(
            *seen.lock(),
            vec![PipelineStage::Generation, PipelineStage::Complete]
        );
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&PipelineStage::OutlierInjection).unwrap();
        assert_eq!(json, "\"outlier_injection\"");
    }
}
