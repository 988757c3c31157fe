//! Shared utilities for the pipeline stages.
//!
//! This module contains the column helpers, descriptive statistics and
//! row-sampling primitives used across multiple modules.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

// =============================================================================
// Column Access Utilities
// =============================================================================

/// Look up a column as a Series, mapping a miss to [`PipelineError::ColumnNotFound`].
pub fn column_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Non-null values of a numeric Series as `f64`, in row order.
pub fn numeric_values(series: &Series) -> Result<Vec<f64>> {
    if !is_numeric_dtype(series.dtype()) {
        return Err(PipelineError::InvalidBounds {
            column: series.name().to_string(),
            reason: format!("expected a numeric column, found {}", series.dtype()),
        });
    }
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().flatten().collect())
}

/// Null count of every column, keyed by column name.
pub fn null_counts(df: &DataFrame) -> BTreeMap<String, usize> {
    df.get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count()))
        .collect()
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Calculate the mode (most frequent value) of a string Series.
///
/// Ties resolve to the lexicographically smallest value, so the result does
/// not depend on hash ordering.
pub fn string_mode(series: &Series) -> Option<String> {
    let str_chunked = series.str().ok()?;

    let mut value_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (val, count) in value_counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((val, count));
        }
    }
    best.map(|(val, _)| val.to_string())
}

/// Quantile of pre-sorted data by linear interpolation between closest ranks
/// (R-7, the NumPy and pandas default).
///
/// Returns `None` for empty input or `p` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    let fraction = h - lower as f64;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Round to a fixed number of decimal places.
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always `Float64`.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Float64)?;
    let filled: Vec<Option<f64>> = cast
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let filled: Vec<Option<&str>> = series
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Sampling Utilities
// =============================================================================

/// Number of rows a fraction selects out of `n`, rounded to the nearest row.
pub fn sample_size(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).round() as usize).min(n)
}

/// Sample `round(fraction × n)` distinct row indices uniformly, returned sorted.
pub fn sample_rows<R: Rng + ?Sized>(rng: &mut R, n: usize, fraction: f64) -> Vec<usize> {
    let amount = sample_size(n, fraction);
    let mut rows = rand::seq::index::sample(rng, n, amount).into_vec();
    rows.sort_unstable();
    rows
}

/// Boolean row mask with `true` at each of the given indices.
pub fn row_mask(n: usize, rows: &[usize]) -> Vec<bool> {
    let selected: HashSet<usize> = rows.iter().copied().collect();
    (0..n).map(|i| selected.contains(&i)).collect()
}

// =============================================================================
// Tests
// =============================================================================
