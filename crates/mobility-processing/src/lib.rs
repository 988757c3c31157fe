//! Urban Mobility Cleaning Pipeline Library
//!
//! A reproducible data-quality pipeline built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline synthesizes a dataset of urban trips, damages it on purpose,
//! then repairs it, keeping a snapshot after every stage:
//!
//! 1. **Generation**: `record_count` clean trip records from a seeded RNG
//! 2. **Null Injection**: missing values in `duration_min` and `user_id`
//! 3. **Imputation**: median for durations, mode for users
//! 4. **Outlier Injection**: a fraction of distances multiplied by a factor
//! 5. **Outlier Capping**: distances clamped into the IQR fences
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mobility_processing::{Pipeline, PipelineConfig};
//!
//! // Canonical run: 200 records, seeds 42 / 123, five CSV snapshots in "."
//! let result = Pipeline::builder().build()?.run()?;
//!
//! println!(
//!     "Bounds: [{:.2}, {:.2}], capped {} values",
//!     result.bounds.lower, result.bounds.upper, result.summary.values_capped
//! );
//!
//! // Custom scenario
//! let config = PipelineConfig::builder()
//!     .record_count(1_000)
//!     .null_fraction(0.2)
//!     .output_dir("snapshots")
//!     .build()?;
//!
//! let result = Pipeline::builder().config(config).build()?.run()?;
//! ```
//!
//! # Snapshots
//!
//! Each stage hands its frame to a [`SnapshotSink`]. By default this is a
//! [`CsvSnapshotWriter`] producing `{prefix}_1.csv` … `{prefix}_5.csv`; use
//! [`MemorySnapshotStore`] or your own sink to keep them elsewhere.
//!
//! # Progress Reporting
//!
//! ```rust,ignore
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

pub mod config;
pub mod corruption;
pub mod diagnostics;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod reporting;
pub mod synthesizer;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use corruption::{NullInjection, NullInjector, OutlierInjector};
pub use diagnostics::{NullMap, OutlierScatter, ScatterPoint};
pub use error::{PipelineError, ResultExt};
pub use imputers::{StatisticalImputer, TripImputation};
pub use pipeline::{
    ClosureProgressReporter, CsvSnapshotWriter, IqrBounds, MemorySnapshotStore, OutlierHandler,
    Pipeline, PipelineBuilder, PipelineStage, ProgressReporter, ProgressUpdate, SnapshotSink,
    read_snapshot,
};
pub use reporting::{CleaningOverview, PipelineReport, ReportGenerator};
pub use synthesizer::TripSynthesizer;
pub use types::{ImputationSummary, PipelineResult, PipelineSummary, StageSummary, TRIP_COLUMNS};
