//! Main pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the generate, corrupt, impute and clip workflow.

use crate::config::{ConfigValidationError, PipelineConfig};
use crate::corruption::{NullInjector, OutlierInjector};
use crate::error::{PipelineError, Result, ResultExt};
use crate::imputers::StatisticalImputer;
use crate::pipeline::outliers::OutlierHandler;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::pipeline::snapshot::SnapshotSink;
use crate::reporting::ReportGenerator;
use crate::synthesizer::TripSynthesizer;
use crate::types::{DISTANCE_KM, PipelineResult, PipelineSummary, StageSummary};
use crate::utils::null_counts;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The mobility cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use mobility_processing::{MemorySnapshotStore, Pipeline, PipelineConfig};
/// use std::sync::Arc;
///
/// // Canonical run, snapshots written to the working directory
/// let result = Pipeline::builder().build()?.run()?;
///
/// // Keep the snapshots in memory instead
/// let store = Arc::new(MemorySnapshotStore::new());
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().save_to_disk(false).build()?)
///     .snapshot_sink(store.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    snapshot_sink: Option<Arc<dyn SnapshotSink>>,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all five stages in order.
    ///
    /// Each snapshot is handed to the sink before the next stage starts. Any
    /// failure aborts the run; snapshots already persisted stay on disk.
    pub fn run(&self) -> Result<PipelineResult> {
        match self.run_internal() {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Hand a snapshot to the sink and summarize it.
    fn persist_snapshot(&self, stage: PipelineStage, df: &DataFrame) -> Result<StageSummary> {
        let snapshot_path = match &self.snapshot_sink {
            Some(sink) => sink
                .persist(stage, df)
                .context(format!("Persisting snapshot of stage '{}'", stage))?,
            None => None,
        };

        Ok(StageSummary {
            stage,
            rows: df.height(),
            null_counts: null_counts(df),
            snapshot_path: snapshot_path.map(|p| p.display().to_string()),
        })
    }

    fn run_internal(&self) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let config = &self.config;

        info!("Starting mobility cleaning pipeline...");

        let mut stages = Vec::with_capacity(PipelineStage::SNAPSHOT_STAGES.len());
        let mut processing_steps: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        // Step 1: Generate the clean dataset
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Generation,
            0.0,
            "Generating trip records...",
        ));
        info!("Step 1: Generating {} trip records...", config.record_count);

        let mut generation_rng = StdRng::seed_from_u64(config.generation_seed);
        let generated = TripSynthesizer::generate(config, &mut generation_rng)?;
        processing_steps.push(format!("Generated {} trip records", generated.height()));
        stages.push(self.persist_snapshot(PipelineStage::Generation, &generated)?);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Generation,
            1.0,
            "Trip generation complete",
        ));

        // Null and outlier injection draw from one stream, in this order.
        let mut corruption_rng = StdRng::seed_from_u64(config.corruption_seed);

        // Step 2: Inject nulls
        self.report_progress(ProgressUpdate::new(
            PipelineStage::NullInjection,
            0.0,
            "Injecting missing values...",
        ));
        info!("Step 2: Injecting nulls ({:.0}% per column)...", config.null_fraction * 100.0);

        let injection =
            NullInjector::inject_trip_nulls(&generated, config.null_fraction, &mut corruption_rng)?;
        for (column, rows) in &injection.rows {
            processing_steps.push(format!("Injected {} nulls into '{}'", rows.len(), column));
        }
        let with_nulls = injection.data;
        stages.push(self.persist_snapshot(PipelineStage::NullInjection, &with_nulls)?);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::NullInjection,
            1.0,
            "Null injection complete",
        ));

        // Step 3: Impute
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            0.0,
            "Imputing missing values...",
        ));
        info!("Step 3: Imputing missing values...");

        let imputation = StatisticalImputer::impute_trip_nulls(&with_nulls)?;
        processing_steps.extend(imputation.processing_steps);
        let imputed = imputation.data;
        stages.push(self.persist_snapshot(PipelineStage::Imputation, &imputed)?);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            1.0,
            "Imputation complete",
        ));

        // Step 4: Inject outliers
        self.report_progress(ProgressUpdate::new(
            PipelineStage::OutlierInjection,
            0.0,
            "Injecting outliers...",
        ));
        info!("Step 4: Injecting outliers into {}...", DISTANCE_KM);

        let (with_outliers, injected_outliers) = OutlierInjector::inject(
            &imputed,
            DISTANCE_KM,
            config.outlier_fraction,
            config.outlier_factor,
            &mut corruption_rng,
        )?;
        processing_steps.push(format!(
            "Multiplied {} values in '{}' by {}",
            injected_outliers.len(),
            DISTANCE_KM,
            config.outlier_factor
        ));
        stages.push(self.persist_snapshot(PipelineStage::OutlierInjection, &with_outliers)?);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::OutlierInjection,
            1.0,
            "Outlier injection complete",
        ));

        // Step 5: Detect and cap outliers
        self.report_progress(ProgressUpdate::new(
            PipelineStage::OutlierCapping,
            0.0,
            "Capping outliers...",
        ));
        info!("Step 5: Detecting and capping outliers...");

        let bounds = OutlierHandler::iqr_bounds(&with_outliers, DISTANCE_KM, config.iqr_multiplier)?;
        info!(
            "Outlier bounds for {}: lower={:.2}, upper={:.2}",
            DISTANCE_KM, bounds.lower, bounds.upper
        );
        if bounds.iqr == 0.0 {
            warnings.push(format!("IQR of '{}' is zero", DISTANCE_KM));
        }

        let outliers_detected = OutlierHandler::detect(&with_outliers, DISTANCE_KM, &bounds)?
            .into_iter()
            .filter(|&hit| hit)
            .count();
        let (cleaned, values_capped) =
            OutlierHandler::cap_outliers(&with_outliers, DISTANCE_KM, &bounds)?;
        processing_steps.push(format!(
            "Capped {} values in '{}' to [{:.2}, {:.2}]",
            values_capped, DISTANCE_KM, bounds.lower, bounds.upper
        ));
        stages.push(self.persist_snapshot(PipelineStage::OutlierCapping, &cleaned)?);

        self.report_progress(ProgressUpdate::new(
            PipelineStage::OutlierCapping,
            1.0,
            "Outlier capping complete",
        ));

        let remaining_nulls: usize = null_counts(&cleaned).values().sum();
        if remaining_nulls > 0 {
            warn!("{} nulls remain in the cleaned dataset", remaining_nulls);
            warnings.push(format!("{} nulls remain in the cleaned dataset", remaining_nulls));
        }

        let summary = PipelineSummary {
            record_count: config.record_count,
            duration_ms: start_time.elapsed().as_millis() as u64,
            stages,
            injected_nulls: injection.rows,
            imputation: imputation.summary,
            injected_outliers,
            bounds,
            outliers_detected,
            values_capped,
            processing_steps,
            warnings,
        };

        // Step 6: Write the JSON report only if enabled
        let report_path = if config.generate_reports {
            self.report_progress(ProgressUpdate::new(
                PipelineStage::ReportGeneration,
                0.0,
                "Writing run report...",
            ));
            info!("Step 6: Writing run report...");

            let generator = ReportGenerator::new(&config.output_dir, &config.snapshot_prefix);
            let report = ReportGenerator::build_report(config, &summary);
            let path = generator
                .write_report_to_file(&report)
                .map_err(|e| PipelineError::ReportGenerationFailed(e.to_string()))?;

            self.report_progress(ProgressUpdate::new(
                PipelineStage::ReportGeneration,
                1.0,
                "Run report written",
            ));
            Some(path)
        } else {
            None
        };

        info!("Pipeline finished in {}ms", summary.duration_ms);

        Ok(PipelineResult {
            generated,
            with_nulls,
            imputed,
            with_outliers,
            cleaned,
            bounds,
            summary,
            report_path,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    snapshot_sink: Option<Arc<dyn SnapshotSink>>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience wrapper around [`ClosureProgressReporter`].
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set where snapshots go.
    ///
    /// An explicit sink is always used. Without one, snapshots are written as
    /// CSV into the configured output directory when `save_to_disk` is set.
    pub fn snapshot_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.snapshot_sink = Some(sink);
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let snapshot_sink = match self.snapshot_sink {
            Some(sink) => Some(sink),
            None if config.save_to_disk => {
                Some(Arc::new(config.snapshot_writer()) as Arc<dyn SnapshotSink>)
            }
            None => None,
        };

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            snapshot_sink,
        })
    }
}
