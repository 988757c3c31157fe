//! Missing-value injection.

use crate::error::Result;
use crate::types::{DURATION_MIN, USER_ID};
use crate::utils::{column_series, row_mask, sample_rows};
use polars::prelude::*;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Result of injecting nulls into the trip dataset.
#[derive(Debug, Clone)]
pub struct NullInjection {
    pub data: DataFrame,
    /// Nulled row indices (sorted), keyed by column.
    pub rows: BTreeMap<String, Vec<usize>>,
}

/// Marks random cells as missing.
pub struct NullInjector;

impl NullInjector {
    /// Null `duration_min` and `user_id` in two independently sampled row
    /// subsets of size `round(fraction × N)`. The subsets may overlap.
    pub fn inject_trip_nulls<R: Rng + ?Sized>(
        df: &DataFrame,
        fraction: f64,
        rng: &mut R,
    ) -> Result<NullInjection> {
        info!("Injecting nulls into {} and {}...", DURATION_MIN, USER_ID);

        let mut rows = BTreeMap::new();
        let mut data = df.clone();
        for column in [DURATION_MIN, USER_ID] {
            let (next, nulled) = Self::inject(&data, column, fraction, rng)?;
            debug!("Nulled {} cells in '{}'", nulled.len(), column);
            rows.insert(column.to_string(), nulled);
            data = next;
        }

        Ok(NullInjection { data, rows })
    }

    /// Null a uniformly sampled `round(fraction × N)` subset of one column.
    ///
    /// Returns the new frame and the nulled row indices. The input frame is
    /// left untouched.
    pub fn inject<R: Rng + ?Sized>(
        df: &DataFrame,
        column: &str,
        fraction: f64,
        rng: &mut R,
    ) -> Result<(DataFrame, Vec<usize>)> {
        let series = column_series(df, column)?;
        let rows = sample_rows(rng, df.height(), fraction);
        let mask = BooleanChunked::from_slice("mask".into(), &row_mask(df.height(), &rows));

        // Null where the mask is set, keep the original value elsewhere.
        let nulls = Series::full_null(series.name().clone(), series.len(), series.dtype());
        let corrupted = nulls.zip_with(&mask, series)?;

        let mut out = df.clone();
        out.replace(column, corrupted)?;
        Ok((out, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DISTANCE_KM, ZONE};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_frame(n: usize) -> DataFrame {
        let durations: Vec<i64> = (0..n as i64).collect();
        let users: Vec<String> = (0..n).map(|i| format!("U{:02}", i % 8 + 1)).collect();
        let distances: Vec<f64> = (0..n).map(|i| i as f64 + 1.0).collect();
        let zones: Vec<&str> = (0..n).map(|_| "north").collect();
        df![
            DISTANCE_KM => distances,
            DURATION_MIN => durations,
            ZONE => zones,
            USER_ID => users,
        ]
        .unwrap()
    }

    #[test]
    fn test_inject_exact_count() {
        let df = sample_frame(200);
        let mut rng = StdRng::seed_from_u64(123);
        let (out, rows) = NullInjector::inject(&df, DURATION_MIN, 0.10, &mut rng).unwrap();

        assert_eq!(rows.len(), 20);
        assert_eq!(out.column(DURATION_MIN).unwrap().null_count(), 20);
        assert_eq!(out.height(), 200);
    }

    #[test]
    fn test_inject_nulls_exactly_sampled_rows() {
        let df = sample_frame(50);
        let mut rng = StdRng::seed_from_u64(1);
        let (out, rows) = NullInjector::inject(&df, DURATION_MIN, 0.2, &mut rng).unwrap();

        let values = out.column(DURATION_MIN).unwrap().as_materialized_series().i64().unwrap().clone();
        for (i, v) in values.into_iter().enumerate() {
            if rows.contains(&i) {
                assert_eq!(v, None);
            } else {
                assert_eq!(v, Some(i as i64));
            }
        }
    }

    #[test]
    fn test_inject_leaves_input_untouched() {
        let df = sample_frame(40);
        let mut rng = StdRng::seed_from_u64(5);
        let _ = NullInjector::inject(&df, USER_ID, 0.5, &mut rng).unwrap();
        assert_eq!(df.column(USER_ID).unwrap().null_count(), 0);
    }

    #[test]
    fn test_inject_trip_nulls_targets_two_columns_only() {
        let df = sample_frame(200);
        let mut rng = StdRng::seed_from_u64(123);
        let injection = NullInjector::inject_trip_nulls(&df, 0.10, &mut rng).unwrap();

        assert_eq!(injection.data.column(DURATION_MIN).unwrap().null_count(), 20);
        assert_eq!(injection.data.column(USER_ID).unwrap().null_count(), 20);
        assert_eq!(injection.data.column(DISTANCE_KM).unwrap().null_count(), 0);
        assert_eq!(injection.data.column(ZONE).unwrap().null_count(), 0);
        assert_eq!(injection.rows[DURATION_MIN].len(), 20);
        assert_eq!(injection.rows[USER_ID].len(), 20);

        // untouched columns are byte-identical
        assert!(injection.data.column(DISTANCE_KM).unwrap().as_materialized_series()
            .equals(df.column(DISTANCE_KM).unwrap().as_materialized_series()));
    }

    #[test]
    fn test_inject_zero_fraction() {
        let df = sample_frame(10);
        let mut rng = StdRng::seed_from_u64(0);
        let (out, rows) = NullInjector::inject(&df, USER_ID, 0.0, &mut rng).unwrap();
        assert!(rows.is_empty());
        assert!(out.equals_missing(&df));
    }

    #[test]
    fn test_inject_missing_column() {
        let df = sample_frame(10);
        let mut rng = StdRng::seed_from_u64(0);
        let err = NullInjector::inject(&df, "fare", 0.1, &mut rng).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
