//! Report generation module.
//!
//! A [`PipelineReport`] bundles the configuration, the run summary and the
//! snapshot paths of one run. It is suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use mobility_processing::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(pipeline.config(), &result.summary);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! // Or write `{prefix}_report.json`
//! let generator = ReportGenerator::new("output", "urban_mobility");
//! generator.write_report_to_file(&report)?;
//! ```

mod generator;

pub use generator::{CleaningOverview, PipelineReport, ReportGenerator};
