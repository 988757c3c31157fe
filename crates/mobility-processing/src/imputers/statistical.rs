//! Statistical imputation methods.
//!
//! Provides median imputation for numeric columns and mode imputation for
//! categorical columns.

use crate::error::{PipelineError, Result};
use crate::types::{DURATION_MIN, ImputationSummary, USER_ID};
use crate::utils::{column_series, fill_numeric_nulls, fill_string_nulls, string_mode};
use polars::prelude::*;
use tracing::{debug, info};

/// Result of imputing the trip dataset.
#[derive(Debug, Clone)]
pub struct TripImputation {
    pub data: DataFrame,
    pub summary: ImputationSummary,
    pub processing_steps: Vec<String>,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill `duration_min` with its median and `user_id` with its mode.
    ///
    /// Both statistics are computed over the non-null values of `df`; the
    /// input frame is left untouched.
    pub fn impute_trip_nulls(df: &DataFrame) -> Result<TripImputation> {
        info!("Imputing missing values...");

        let durations_filled = column_series(df, DURATION_MIN)?.null_count();
        let users_filled = column_series(df, USER_ID)?.null_count();

        let mut data = df.clone();
        let mut processing_steps = Vec::new();
        let duration_median = Self::apply_numeric_median(&mut data, DURATION_MIN, &mut processing_steps)?;
        let user_mode = Self::apply_mode_imputation(&mut data, USER_ID, &mut processing_steps)?;

        Ok(TripImputation {
            data,
            summary: ImputationSummary {
                duration_median,
                user_mode,
                durations_filled,
                users_filled,
            },
            processing_steps,
        })
    }

    /// Apply median imputation for a numeric column.
    ///
    /// The column is rewritten as `Float64` since the median may be
    /// fractional. Returns the fill value.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<f64> {
        let series = column_series(df, col_name)?;
        let median_val = series
            .median()
            .ok_or_else(|| PipelineError::NoValidValues(col_name.to_string()))?;
        let missing = series.null_count();

        let filled = fill_numeric_nulls(series, median_val)?;
        df.replace(col_name, filled)?;

        debug!("Median of '{}' is {}", col_name, median_val);
        processing_steps.push(format!(
            "Filled {} values in '{}' with median: {:.2}",
            missing, col_name, median_val
        ));

        Ok(median_val)
    }

    /// Apply mode imputation for a categorical column. Returns the fill value.
    pub fn apply_mode_imputation(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<String> {
        let series = column_series(df, col_name)?;
        let mode_val =
            string_mode(series).ok_or_else(|| PipelineError::NoValidValues(col_name.to_string()))?;
        let missing = series.null_count();

        let filled = fill_string_nulls(series, &mode_val)?;
        df.replace(col_name, filled)?;

        debug!("Mode of '{}' is '{}'", col_name, mode_val);
        processing_steps.push(format!(
            "Filled {} values in '{}' with mode: '{}'",
            missing, col_name, mode_val
        ));

        Ok(mode_val)
    }
}
