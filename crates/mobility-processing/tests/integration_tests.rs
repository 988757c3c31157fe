//! Integration tests for the urban mobility cleaning pipeline.
//!
//! These tests run the whole pipeline and check the snapshots it leaves
//! behind, both in memory and on disk.

use mobility_processing::{
    MemorySnapshotStore, NullMap, OutlierHandler, OutlierScatter, Pipeline, PipelineConfig,
    PipelineError, PipelineResult, PipelineStage, ProgressUpdate, TRIP_COLUMNS, read_snapshot,
};
use parking_lot::Mutex;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn run_canonical_in_memory() -> PipelineResult {
    Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .save_to_disk(false)
                .build()
                .expect("valid config"),
        )
        .build()
        .expect("valid pipeline")
        .run()
        .expect("pipeline run")
}

fn f64_values(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .expect("column exists")
        .as_materialized_series()
        .cast(&DataType::Float64)
        .expect("numeric column")
        .f64()
        .expect("f64 column")
        .into_no_null_iter()
        .collect()
}

fn total_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

// ============================================================================
// Canonical Scenario (N=200, seeds 42/123, f=0.10, g=0.05, factor 10)
// ============================================================================

#[test]
fn test_canonical_final_dataset() {
    let result = run_canonical_in_memory();
    let cleaned = result.final_data();

    assert_eq!(cleaned.height(), 200);
    assert_eq!(total_nulls(cleaned), 0);
    let names: Vec<String> = cleaned
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(names, TRIP_COLUMNS.to_vec());

    // Bounds come from the corrupted distribution
    let bounds = OutlierHandler::iqr_bounds(&result.with_outliers, "distance_km", 1.5)
        .expect("bounds");
    assert_eq!(bounds, result.bounds);
    assert!(bounds.lower <= bounds.upper);
    for d in f64_values(cleaned, "distance_km") {
        assert!(d >= bounds.lower && d <= bounds.upper, "{} outside bounds", d);
    }
}

#[test]
fn test_canonical_snapshot_invariants() {
    let result = run_canonical_in_memory();

    // Snapshot 1: clean and in range
    assert_eq!(result.generated.height(), 200);
    assert_eq!(total_nulls(&result.generated), 0);
    for d in f64_values(&result.generated, "distance_km") {
        assert!((1.0..=50.0).contains(&d));
    }
    for m in f64_values(&result.generated, "duration_min") {
        assert!((1.0..100.0).contains(&m));
    }

    // Snapshot 2: exactly round(0.10 * 200) nulls per targeted field
    let null_map = NullMap::from_frame(&result.with_nulls);
    assert_eq!(
        null_map.column_counts(),
        vec![
            ("date".to_string(), 0),
            ("transport_mode".to_string(), 0),
            ("distance_km".to_string(), 0),
            ("duration_min".to_string(), 20),
            ("zone".to_string(), 0),
            ("user_id".to_string(), 20),
        ]
    );

    // Snapshot 3: filled, other columns untouched
    assert_eq!(total_nulls(&result.imputed), 0);
    assert!(
        result
            .imputed
            .column("distance_km")
            .unwrap()
            .as_materialized_series()
            .equals(
                result
                    .generated
                    .column("distance_km")
                    .unwrap()
                    .as_materialized_series()
            )
    );

    // Snapshot 4: exactly round(0.05 * 200) distances multiplied by 10
    let before = f64_values(&result.imputed, "distance_km");
    let after = f64_values(&result.with_outliers, "distance_km");
    let changed: Vec<usize> = (0..before.len()).filter(|&i| before[i] != after[i]).collect();
    assert_eq!(changed, result.summary.injected_outliers);
    assert_eq!(changed.len(), 10);
    for &i in &changed {
        assert!((after[i] - before[i] * 10.0).abs() < 1e-9);
    }
}

#[test]
fn test_capping_is_idempotent() {
    let result = run_canonical_in_memory();

    let (again, capped) =
        OutlierHandler::cap_outliers(&result.cleaned, "distance_km", &result.bounds)
            .expect("capping");

    assert_eq!(capped, 0);
    assert!(again.equals(&result.cleaned));
}

#[test]
fn test_scatter_matches_capped_count() {
    let result = run_canonical_in_memory();

    let before = OutlierScatter::from_frame(&result.with_outliers, "distance_km", &result.bounds)
        .expect("scatter");
    let after = OutlierScatter::from_frame(&result.cleaned, "distance_km", &result.bounds)
        .expect("scatter");

    assert_eq!(before.outlier_count(), result.summary.values_capped);
    assert_eq!(after.outlier_count(), 0);
}

#[test]
fn test_same_seeds_same_snapshots() {
    let first = run_canonical_in_memory();
    let second = run_canonical_in_memory();

    for stage in PipelineStage::SNAPSHOT_STAGES {
        let a = first.snapshot(stage).unwrap();
        let b = second.snapshot(stage).unwrap();
        assert!(a.equals_missing(b), "snapshot of {} differs", stage);
    }
}

#[test]
fn test_different_corruption_seed_changes_nulls_only() {
    let first = run_canonical_in_memory();
    let other = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .corruption_seed(7)
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(first.generated.equals(&other.generated));
    assert_ne!(first.summary.injected_nulls, other.summary.injected_nulls);
}

// ============================================================================
// Snapshot Persistence
// ============================================================================

#[test]
fn test_snapshots_written_to_disk() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path())
        .build()
        .unwrap();

    let result = Pipeline::builder()
        .config(config.clone())
        .build()
        .unwrap()
        .run()
        .unwrap();

    for (i, stage) in PipelineStage::SNAPSHOT_STAGES.into_iter().enumerate() {
        let path = config.snapshot_path(stage).expect("snapshot stage");
        assert_eq!(path, dir.path().join(format!("urban_mobility_{}.csv", i + 1)));
        assert!(path.exists(), "missing {}", path.display());

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("date,transport_mode,distance_km,duration_min,zone,user_id")
        );
        assert_eq!(lines.count(), 200);
    }
    assert!(!dir.path().join("urban_mobility_report.json").exists());

    // Nulls survive the CSV round trip as empty fields
    let with_nulls = read_snapshot(dir.path().join("urban_mobility_2.csv")).unwrap();
    assert_eq!(with_nulls.height(), 200);
    assert_eq!(with_nulls.column("duration_min").unwrap().null_count(), 20);
    assert_eq!(with_nulls.column("user_id").unwrap().null_count(), 20);
    assert_eq!(with_nulls.column("date").unwrap().dtype(), &DataType::Date);

    let cleaned = read_snapshot(dir.path().join("urban_mobility_5.csv")).unwrap();
    assert_eq!(total_nulls(&cleaned), 0);
    for d in f64_values(&cleaned, "distance_km") {
        assert!(d >= result.bounds.lower - 1e-9 && d <= result.bounds.upper + 1e-9);
    }
}

#[test]
fn test_snapshots_overwritten_on_rerun() {
    let dir = TempDir::new().unwrap();
    let config = |records| {
        PipelineConfig::builder()
            .record_count(records)
            .output_dir(dir.path())
            .build()
            .unwrap()
    };

    Pipeline::builder().config(config(200)).build().unwrap().run().unwrap();
    Pipeline::builder().config(config(30)).build().unwrap().run().unwrap();

    let content = fs::read_to_string(dir.path().join("urban_mobility_1.csv")).unwrap();
    assert_eq!(content.lines().count(), 31);
}

#[test]
fn test_report_generation() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path())
        .snapshot_prefix("city")
        .generate_reports(true)
        .build()
        .unwrap();

    let result = Pipeline::builder().config(config).build().unwrap().run().unwrap();

    let report_path = result.report_path.expect("report written");
    assert_eq!(report_path, dir.path().join("city_report.json"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["overview"]["rows"], 200);
    assert_eq!(json["overview"]["nulls_injected"], 40);
    assert_eq!(json["overview"]["nulls_remaining"], 0);
    assert_eq!(json["snapshot_files"].as_array().map(|a| a.len()), Some(5));
}

#[test]
fn test_memory_store_receives_all_snapshots() {
    let store = Arc::new(MemorySnapshotStore::new());
    let result = Pipeline::builder()
        .config(PipelineConfig::builder().save_to_disk(false).build().unwrap())
        .snapshot_sink(store.clone())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(store.len(), 5);
    let stored = store.get(PipelineStage::OutlierCapping).unwrap();
    assert!(stored.equals(result.final_data()));
}

// ============================================================================
// Progress and Errors
// ============================================================================

#[test]
fn test_progress_updates() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&updates);

    Pipeline::builder()
        .config(PipelineConfig::builder().save_to_disk(false).build().unwrap())
        .on_progress(move |update| sink.lock().push(update))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let updates = updates.lock();
    // start and end of five stages, plus completion
    assert_eq!(updates.len(), 11);
    let last = updates.last().unwrap();
    assert_eq!(last.stage, PipelineStage::Complete);
    assert_eq!(last.progress, 1.0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = PipelineConfig::builder()
        .record_count(0)
        .build()
        .unwrap_err();
    let err = PipelineError::from(err);
    assert_eq!(err.error_code(), "INVALID_CONFIG");
}

#[test]
fn test_single_record_run() {
    let result = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .record_count(1)
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .run()
        .unwrap();

    // round(0.1) == 0 and round(0.05) == 0: nothing is corrupted
    assert_eq!(total_nulls(&result.with_nulls), 0);
    assert!(result.summary.injected_outliers.is_empty());
    assert_eq!(result.final_data().height(), 1);
    assert_eq!(result.bounds.iqr, 0.0);
}
