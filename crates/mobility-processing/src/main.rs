//! CLI entry point for the urban mobility cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use mobility_processing::{
    Pipeline, PipelineConfig, PipelineReport, PipelineResult, PipelineStage, ReportGenerator,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Urban mobility data-quality pipeline",
    long_about = "Synthesizes urban trip records, injects missing values and outliers,\n\
                  then repairs them, writing a CSV snapshot after every stage.\n\n\
                  Running without arguments reproduces the canonical scenario.\n\n\
                  EXAMPLES:\n  \
                  # Canonical run, snapshots in the current directory\n  \
                  mobility-processing\n\n  \
                  # Larger dataset, snapshots and report in out/\n  \
                  mobility-processing --records 1000 -o out/ --emit-report\n\n  \
                  # Machine-readable summary only\n  \
                  mobility-processing --no-snapshots --json"
)]
struct Args {
    /// Directory for snapshots and reports
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Snapshot files are named <PREFIX>_1.csv ... <PREFIX>_5.csv
    #[arg(long, default_value = "urban_mobility")]
    prefix: String,

    /// Number of trip records to generate
    #[arg(short = 'n', long, default_value = "200")]
    records: usize,

    /// Seed of the generator RNG
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Seed of the RNG shared by null and outlier injection
    #[arg(long, default_value = "123")]
    corruption_seed: u64,

    /// Fraction of rows nulled in duration_min and in user_id (0.0 - 1.0)
    #[arg(long, default_value = "0.10")]
    null_fraction: f64,

    /// Fraction of rows whose distance_km is multiplied (0.0 - 1.0)
    #[arg(long, default_value = "0.05")]
    outlier_fraction: f64,

    /// Multiplier applied to injected outliers
    #[arg(long, default_value = "10")]
    outlier_factor: f64,

    /// IQR multiplier of the outlier fences
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Keep snapshots in memory only
    #[arg(long)]
    no_snapshots: bool,

    /// Write a JSON report to <OUTPUT_DIR>/<PREFIX>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Report output is handled here, not inside the pipeline
    let config = PipelineConfig::builder()
        .record_count(args.records)
        .generation_seed(args.seed)
        .corruption_seed(args.corruption_seed)
        .null_fraction(args.null_fraction)
        .outlier_fraction(args.outlier_fraction)
        .outlier_factor(args.outlier_factor)
        .iqr_multiplier(args.iqr_multiplier)
        .output_dir(&args.output_dir)
        .snapshot_prefix(&args.prefix)
        .save_to_disk(!args.no_snapshots)
        .generate_reports(false)
        .build()?;

    let pipeline = build_pipeline(&args, config)?;
    run_pipeline(&pipeline, &args)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            if update.stage_progress >= 1.0 && update.stage != PipelineStage::Complete {
                info!(
                    "[{:>3.0}%] {}: {}",
                    update.progress * 100.0,
                    update.stage.display_name(),
                    update.message
                );
            }
        });
    }

    Ok(builder.build()?)
}

fn run_pipeline(pipeline: &Pipeline, args: &Args) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting urban mobility cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let result = pipeline.run().map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    let report = ReportGenerator::build_report(pipeline.config(), &result.summary);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let generator = ReportGenerator::new(&args.output_dir, &args.prefix);
        let report_path = generator.write_report_to_file(&report)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report, &result);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &PipelineReport, result: &PipelineResult) {
    let overview = &report.overview;
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Records: {} ({}ms)", overview.rows, overview.duration_ms);
    println!();

    println!("Nulls per column:");
    let before = summary.stage(PipelineStage::NullInjection);
    let after = summary.stage(PipelineStage::Imputation);
    if let (Some(before), Some(after)) = (before, after) {
        for (column, count) in &before.null_counts {
            let remaining = after.null_counts.get(column).copied().unwrap_or(0);
            println!("  {:<16} {:>4} -> {}", column, count, remaining);
        }
    }
    println!(
        "  Filled duration_min with median {:.2}, user_id with mode '{}'",
        summary.imputation.duration_median, summary.imputation.user_mode
    );
    println!();

    println!("Outliers in distance_km:");
    println!(
        "  Bounds: [{:.2}, {:.2}] (Q1 {:.2}, Q3 {:.2}, IQR {:.2})",
        result.bounds.lower, result.bounds.upper, result.bounds.q1, result.bounds.q3, result.bounds.iqr
    );
    println!(
        "  Injected: {}, detected: {}, capped: {}",
        overview.outliers_injected, summary.outliers_detected, overview.outliers_capped
    );
    println!();

    if !report.snapshot_files.is_empty() {
        println!("Snapshots:");
        for path in &report.snapshot_files {
            println!("  {}", path);
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}
