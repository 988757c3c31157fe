//! Shared types: the trip-record schema and the serializable run summaries.

use crate::pipeline::outliers::IqrBounds;
use crate::pipeline::progress::PipelineStage;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Trip record schema
// ============================================================================

pub const DATE: &str = "date";
pub const TRANSPORT_MODE: &str = "transport_mode";
pub const DISTANCE_KM: &str = "distance_km";
pub const DURATION_MIN: &str = "duration_min";
pub const ZONE: &str = "zone";
pub const USER_ID: &str = "user_id";

/// Column order of every snapshot.
pub const TRIP_COLUMNS: [&str; 6] = [DATE, TRANSPORT_MODE, DISTANCE_KM, DURATION_MIN, ZONE, USER_ID];

pub const DEFAULT_TRANSPORT_MODES: [&str; 5] = ["bus", "subway", "bicycle", "car", "walking"];
pub const DEFAULT_ZONES: [&str; 5] = ["center", "north", "south", "east", "west"];
pub const DEFAULT_USERS: [&str; 8] = ["U01", "U02", "U03", "U04", "U05", "U06", "U07", "U08"];

/// Generated `distance_km` lies in `[DISTANCE_RANGE.0, DISTANCE_RANGE.1)`.
pub const DISTANCE_RANGE: (f64, f64) = (1.0, 50.0);

/// Generated `duration_min` lies in `[DURATION_RANGE.0, DURATION_RANGE.1)`.
pub const DURATION_RANGE: (i64, i64) = (1, 100);

// ============================================================================
// Run summaries
// ============================================================================

/// Row and null counts of one persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: PipelineStage,
    pub rows: usize,
    pub null_counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<String>,
}

impl StageSummary {
    pub fn total_nulls(&self) -> usize {
        self.null_counts.values().sum()
    }
}

/// Values used to fill the nulls during imputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationSummary {
    pub duration_median: f64,
    pub user_mode: String,
    pub durations_filled: usize,
    pub users_filled: usize,
}

/// Everything a run did, in a shape suitable for JSON reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub record_count: usize,
    pub duration_ms: u64,
    pub stages: Vec<StageSummary>,
    /// Row indices that were nulled, keyed by column.
    pub injected_nulls: BTreeMap<String, Vec<usize>>,
    pub imputation: ImputationSummary,
    /// Row indices whose distance was multiplied.
    pub injected_outliers: Vec<usize>,
    pub bounds: IqrBounds,
    pub outliers_detected: usize,
    pub values_capped: usize,
    pub processing_steps: Vec<String>,
    pub warnings: Vec<String>,
}

impl PipelineSummary {
    /// Summary of a given stage, if it ran.
    pub fn stage(&self, stage: PipelineStage) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn snapshot_paths(&self) -> Vec<String> {
        self.stages
            .iter()
            .filter_map(|s| s.snapshot_path.clone())
            .collect()
    }
}

/// Output of a pipeline run.
///
/// Holds every snapshot in memory, whether or not it was also persisted.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Snapshot 1: the clean synthesized records.
    pub generated: DataFrame,
    /// Snapshot 2: nulls injected into `duration_min` and `user_id`.
    pub with_nulls: DataFrame,
    /// Snapshot 3: nulls filled with median / mode.
    pub imputed: DataFrame,
    /// Snapshot 4: some distances multiplied.
    pub with_outliers: DataFrame,
    /// Snapshot 5: distances clamped into `bounds`.
    pub cleaned: DataFrame,
    pub bounds: IqrBounds,
    pub summary: PipelineSummary,
    /// Path of the JSON report, when one was written.
    pub report_path: Option<PathBuf>,
}

impl PipelineResult {
    /// The cleaned dataset.
    pub fn final_data(&self) -> &DataFrame {
        &self.cleaned
    }

    /// The snapshot produced by `stage`, if it is a snapshot stage.
    pub fn snapshot(&self, stage: PipelineStage) -> Option<&DataFrame> {
        match stage {
            PipelineStage::Generation => Some(&self.generated),
            PipelineStage::NullInjection => Some(&self.with_nulls),
            PipelineStage::Imputation => Some(&self.imputed),
            PipelineStage::OutlierInjection => Some(&self.with_outliers),
            PipelineStage::OutlierCapping => Some(&self.cleaned),
            _ => None,
        }
    }
}
