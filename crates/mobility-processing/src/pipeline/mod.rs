//! Pipeline module.
//!
//! This module provides the pipeline orchestration and the components it
//! runs between stages: outlier bounds, progress reporting and snapshot
//! persistence.

mod builder;
pub mod outliers;
pub mod progress;
pub mod snapshot;

pub use builder::{Pipeline, PipelineBuilder};
pub use outliers::{IqrBounds, OutlierHandler};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
pub use snapshot::{CsvSnapshotWriter, MemorySnapshotStore, SnapshotSink, read_snapshot};
