use crate::config::PipelineConfig;
use crate::pipeline::progress::PipelineStage;
use crate::types::PipelineSummary;
use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

// ============================================================================
// Report Types
// ============================================================================

/// Report of one pipeline run.
///
/// The same structure is printed by `--json`, written by `--emit-report`,
/// and written by the pipeline itself when `generate_reports` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Headline numbers of the run
    pub overview: CleaningOverview,
    /// Configuration the run used
    pub config: PipelineConfig,
    /// Full run summary
    pub summary: PipelineSummary,
    /// Snapshot files written, in stage order
    pub snapshot_files: Vec<String>,
}

/// Headline numbers of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningOverview {
    pub rows: usize,
    /// Nulls present after injection
    pub nulls_injected: usize,
    /// Nulls left after imputation
    pub nulls_remaining: usize,
    pub outliers_injected: usize,
    pub outliers_capped: usize,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub duration_ms: u64,
}

impl CleaningOverview {
    pub fn from_summary(summary: &PipelineSummary) -> Self {
        let nulls_at = |stage| {
            summary
                .stage(stage)
                .map(|s| s.total_nulls())
                .unwrap_or_default()
        };

        Self {
            rows: summary.record_count,
            nulls_injected: nulls_at(PipelineStage::NullInjection),
            nulls_remaining: nulls_at(PipelineStage::Imputation),
            outliers_injected: summary.injected_outliers.len(),
            outliers_capped: summary.values_capped,
            lower_bound: summary.bounds.lower,
            upper_bound: summary.bounds.upper,
            duration_ms: summary.duration_ms,
        }
    }
}

/// Builds run reports and writes them next to the snapshots.
pub struct ReportGenerator {
    output_dir: PathBuf,
    prefix: String,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        let config = PipelineConfig::default();
        Self {
            output_dir: config.output_dir,
            prefix: config.snapshot_prefix,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path the report is written to: `{output_dir}/{prefix}_report.json`.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_report.json", self.prefix))
    }

    /// Build a report from a finished run.
    pub fn build_report(config: &PipelineConfig, summary: &PipelineSummary) -> PipelineReport {
        PipelineReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            overview: CleaningOverview::from_summary(summary),
            config: config.clone(),
            summary: summary.clone(),
            snapshot_files: summary.snapshot_paths(),
        }
    }

    /// Write a report as pretty-printed JSON, overwriting any previous one.
    pub fn write_report_to_file(&self, report: &PipelineReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.report_path();
        let content = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&report_path)?;
        file.write_all(content.as_bytes())?;

        debug!("Report size: {} bytes", content.len());
        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::outliers::IqrBounds;
    use crate::types::{ImputationSummary, StageSummary};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn stage(stage: PipelineStage, nulls: usize, path: Option<&str>) -> StageSummary {
        let mut null_counts = BTreeMap::new();
        null_counts.insert("duration_min".to_string(), nulls);
        StageSummary {
            stage,
            rows: 10,
            null_counts,
            snapshot_path: path.map(String::from),
        }
    }

    fn sample_summary() -> PipelineSummary {
        PipelineSummary {
            record_count: 10,
            duration_ms: 7,
            stages: vec![
                stage(PipelineStage::Generation, 0, Some("out/t_1.csv")),
                stage(PipelineStage::NullInjection, 1, Some("out/t_2.csv")),
                stage(PipelineStage::Imputation, 0, Some("out/t_3.csv")),
            ],
            injected_nulls: BTreeMap::from([("duration_min".to_string(), vec![4])]),
            imputation: ImputationSummary {
                duration_median: 30.0,
                user_mode: "U01".to_string(),
                durations_filled: 1,
                users_filled: 0,
            },
            injected_outliers: vec![2],
            bounds: IqrBounds::from_quartiles(10.0, 20.0, 1.5),
            outliers_detected: 1,
            values_capped: 1,
            processing_steps: vec!["Generated 10 trip records".to_string()],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_overview_from_summary() {
        let overview = CleaningOverview::from_summary(&sample_summary());
        assert_eq!(
            overview,
            CleaningOverview {
                rows: 10,
                nulls_injected: 1,
                nulls_remaining: 0,
                outliers_injected: 1,
                outliers_capped: 1,
                lower_bound: -5.0,
                upper_bound: 35.0,
                duration_ms: 7,
            }
        );
    }

    #[test]
    fn test_build_report_lists_snapshots() {
        let report = ReportGenerator::build_report(&PipelineConfig::default(), &sample_summary());
        assert_eq!(
            report.snapshot_files,
            vec!["out/t_1.csv", "out/t_2.csv", "out/t_3.csv"]
        );
        assert_eq!(report.config, PipelineConfig::default());
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().join("reports"), "trips");
        let report = ReportGenerator::build_report(&PipelineConfig::default(), &sample_summary());

        let path = generator.write_report_to_file(&report).unwrap();
        assert_eq!(path, dir.path().join("reports").join("trips_report.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["overview"]["outliers_capped"], 1);
        assert_eq!(json["summary"]["stages"][1]["stage"], "null_injection");
        assert_eq!(json["config"]["snapshot_prefix"], "urban_mobility");
    }
}
