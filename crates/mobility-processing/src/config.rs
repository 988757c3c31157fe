//! Configuration types for the mobility cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! Every default matches the canonical run: 200 records, generation seed 42,
//! corruption seed 123, 10% nulls, 5% outliers multiplied by 10.

use crate::types::{DEFAULT_TRANSPORT_MODES, DEFAULT_USERS, DEFAULT_ZONES};
use crate::pipeline::progress::PipelineStage;
use crate::pipeline::snapshot::CsvSnapshotWriter;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_RECORD_COUNT: usize = 200;
const DEFAULT_GENERATION_SEED: u64 = 42;
const DEFAULT_CORRUPTION_SEED: u64 = 123;
const DEFAULT_NULL_FRACTION: f64 = 0.10;
const DEFAULT_OUTLIER_FRACTION: f64 = 0.05;
const DEFAULT_OUTLIER_FACTOR: f64 = 10.0;
const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
const DEFAULT_SNAPSHOT_PREFIX: &str = "urban_mobility";

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

fn to_owned_vec(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Configuration for the pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use mobility_processing::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .record_count(500)
///     .null_fraction(0.2)
///     .output_dir("snapshots")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of trip records to synthesize.
    /// Default: 200
    pub record_count: usize,

    /// First day of the date range. The range spans `record_count` days.
    /// Default: 2025-01-01
    pub start_date: NaiveDate,

    pub transport_modes: Vec<String>,
    pub zones: Vec<String>,
    pub users: Vec<String>,

    /// Seed of the generator RNG.
    /// Default: 42
    pub generation_seed: u64,

    /// Seed of the RNG shared by the null and outlier injectors.
    /// Default: 123
    pub corruption_seed: u64,

    /// Fraction of rows nulled in `duration_min` and, independently, in `user_id`.
    /// Default: 0.10
    pub null_fraction: f64,

    /// Fraction of rows whose `distance_km` is multiplied.
    /// Default: 0.05
    pub outlier_fraction: f64,

    /// Multiplier applied to the injected outliers.
    /// Default: 10.0
    pub outlier_factor: f64,

    /// IQR multiplier of the Tukey fences.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Directory for snapshots and reports.
    /// Default: "."
    pub output_dir: PathBuf,

    /// Snapshot files are named `{prefix}_{n}.csv`.
    /// Default: "urban_mobility"
    pub snapshot_prefix: String,

    /// Whether to write the five CSV snapshots.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,

    /// Whether to write the JSON run report next to the snapshots.
    /// Default: false
    pub generate_reports: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            record_count: DEFAULT_RECORD_COUNT,
            start_date: default_start_date(),
            transport_modes: to_owned_vec(&DEFAULT_TRANSPORT_MODES),
            zones: to_owned_vec(&DEFAULT_ZONES),
            users: to_owned_vec(&DEFAULT_USERS),
            generation_seed: DEFAULT_GENERATION_SEED,
            corruption_seed: DEFAULT_CORRUPTION_SEED,
            null_fraction: DEFAULT_NULL_FRACTION,
            outlier_fraction: DEFAULT_OUTLIER_FRACTION,
            outlier_factor: DEFAULT_OUTLIER_FACTOR,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            output_dir: PathBuf::from("."),
            snapshot_prefix: DEFAULT_SNAPSHOT_PREFIX.to_string(),
            save_to_disk: true,
            generate_reports: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.record_count == 0 {
            return Err(ConfigValidationError::InvalidRecordCount(self.record_count));
        }

        if self.last_date().is_none() {
            return Err(ConfigValidationError::DateRangeOverflow {
                start: self.start_date,
                days: self.record_count,
            });
        }

        for (field, value) in [
            ("null_fraction", self.null_fraction),
            ("outlier_fraction", self.outlier_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidFraction {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !self.outlier_factor.is_finite() || self.outlier_factor <= 0.0 {
            return Err(ConfigValidationError::InvalidOutlierFactor(self.outlier_factor));
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(self.iqr_multiplier));
        }

        for (field, values) in [
            ("transport_modes", &self.transport_modes),
            ("zones", &self.zones),
            ("users", &self.users),
        ] {
            if values.is_empty() {
                return Err(ConfigValidationError::EmptyVocabulary(field.to_string()));
            }
        }

        if self.snapshot_prefix.trim().is_empty() {
            return Err(ConfigValidationError::EmptySnapshotPrefix);
        }

        Ok(())
    }

    /// Last day of the generated date range, if it is representable.
    pub fn last_date(&self) -> Option<NaiveDate> {
        let offset = self.record_count.checked_sub(1)?;
        self.start_date.checked_add_days(Days::new(offset as u64))
    }

    /// CSV writer for this configuration's output directory and prefix.
    pub fn snapshot_writer(&self) -> CsvSnapshotWriter {
        CsvSnapshotWriter::new(self.output_dir.clone(), self.snapshot_prefix.clone())
    }

    /// Path the snapshot of `stage` is written to, if `stage` has one.
    pub fn snapshot_path(&self, stage: PipelineStage) -> Option<PathBuf> {
        self.snapshot_writer().path_for(stage)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid record count: {0} (must be at least 1)")]
    InvalidRecordCount(usize),

    #[error("Date range of {days} days starting {start} overflows the calendar")]
    DateRangeOverflow { start: NaiveDate, days: usize },

    #[error("Invalid fraction for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidFraction { field: String, value: f64 },

    #[error("Invalid outlier factor: {0} (must be finite and positive)")]
    InvalidOutlierFactor(f64),

    #[error("Invalid IQR multiplier: {0} (must be finite and non-negative)")]
    InvalidIqrMultiplier(f64),

    #[error("Vocabulary '{0}' must not be empty")]
    EmptyVocabulary(String),

    #[error("Snapshot prefix must not be empty")]
    EmptySnapshotPrefix,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    record_count: Option<usize>,
    start_date: Option<NaiveDate>,
    transport_modes: Option<Vec<String>>,
    zones: Option<Vec<String>>,
    users: Option<Vec<String>>,
    generation_seed: Option<u64>,
    corruption_seed: Option<u64>,
    null_fraction: Option<f64>,
    outlier_fraction: Option<f64>,
    outlier_factor: Option<f64>,
    iqr_multiplier: Option<f64>,
    output_dir: Option<PathBuf>,
    snapshot_prefix: Option<String>,
    save_to_disk: Option<bool>,
    generate_reports: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the number of records to synthesize.
    pub fn record_count(mut self, count: usize) -> Self {
        self.record_count = Some(count);
        self
    }

    /// Set the first day of the generated date range.
    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn transport_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.transport_modes = Some(modes.into_iter().map(Into::into).collect());
        self
    }

    pub fn zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = Some(zones.into_iter().map(Into::into).collect());
        self
    }

    pub fn users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users = Some(users.into_iter().map(Into::into).collect());
        self
    }

    /// Set the seed used by the synthesizer.
    pub fn generation_seed(mut self, seed: u64) -> Self {
        self.generation_seed = Some(seed);
        self
    }

    /// Set the seed used by the null and outlier injectors.
    pub fn corruption_seed(mut self, seed: u64) -> Self {
        self.corruption_seed = Some(seed);
        self
    }

    /// Set the fraction of rows receiving nulls.
    ///
    /// # Arguments
    /// * `fraction` - Value between 0.0 and 1.0 (e.g., 0.1 = 10%)
    pub fn null_fraction(mut self, fraction: f64) -> Self {
        self.null_fraction = Some(fraction);
        self
    }

    /// Set the fraction of rows receiving outliers.
    ///
    /// # Arguments
    /// * `fraction` - Value between 0.0 and 1.0 (e.g., 0.05 = 5%)
    pub fn outlier_fraction(mut self, fraction: f64) -> Self {
        self.outlier_fraction = Some(fraction);
        self
    }

    pub fn outlier_factor(mut self, factor: f64) -> Self {
        self.outlier_factor = Some(factor);
        self
    }

    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the output directory for snapshots and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    pub fn snapshot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.snapshot_prefix = Some(prefix.into());
        self
    }

    /// Enable or disable writing the CSV snapshots.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Enable or disable the JSON run report.
    pub fn generate_reports(mut self, generate: bool) -> Self {
        self.generate_reports = Some(generate);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            record_count: self.record_count.unwrap_or(defaults.record_count),
            start_date: self.start_date.unwrap_or(defaults.start_date),
            transport_modes: self.transport_modes.unwrap_or(defaults.transport_modes),
            zones: self.zones.unwrap_or(defaults.zones),
            users: self.users.unwrap_or(defaults.users),
            generation_seed: self.generation_seed.unwrap_or(defaults.generation_seed),
            corruption_seed: self.corruption_seed.unwrap_or(defaults.corruption_seed),
            null_fraction: self.null_fraction.unwrap_or(defaults.null_fraction),
            outlier_fraction: self.outlier_fraction.unwrap_or(defaults.outlier_fraction),
            outlier_factor: self.outlier_factor.unwrap_or(defaults.outlier_factor),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            snapshot_prefix: self.snapshot_prefix.unwrap_or(defaults.snapshot_prefix),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
            generate_reports: self.generate_reports.unwrap_or(defaults.generate_reports),
        };

        config.validate()?;
        Ok(config)
    }
}
