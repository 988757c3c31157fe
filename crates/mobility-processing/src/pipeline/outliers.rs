//! Outlier handling module.
//!
//! Contains the IQR bound computation, per-row outlier detection and capping
//! for a numeric column.
//!
//! Bounds are derived from whatever distribution they are given. The pipeline
//! computes them on the already-corrupted distances, so the injected extremes
//! widen Q3 and the upper fence is only an approximation of the normal range.

use crate::error::{PipelineError, Result};
use crate::utils::{column_series, numeric_values, quantile_sorted};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tukey fences of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub multiplier: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Fences `q1 - m·iqr` and `q3 + m·iqr` from two quartiles.
    pub fn from_quartiles(q1: f64, q3: f64, multiplier: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            multiplier,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        }
    }

    /// Whether a value falls outside the fences.
    #[inline]
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }
}

/// Handles outlier detection and treatment.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Compute IQR bounds over the non-null values of `column`.
    pub fn iqr_bounds(df: &DataFrame, column: &str, multiplier: f64) -> Result<IqrBounds> {
        let series = column_series(df, column)?;
        let mut values = numeric_values(series)?;
        if values.iter().any(|v| v.is_nan()) {
            return Err(PipelineError::InvalidBounds {
                column: column.to_string(),
                reason: "column contains NaN".to_string(),
            });
        }
        values.sort_by(f64::total_cmp);

        let (Some(q1), Some(q3)) = (quantile_sorted(&values, 0.25), quantile_sorted(&values, 0.75))
        else {
            return Err(PipelineError::NoValidValues(column.to_string()));
        };

        let bounds = IqrBounds::from_quartiles(q1, q3, multiplier);
        if bounds.iqr == 0.0 {
            warn!("IQR of '{}' is zero; every differing value is an outlier", column);
        }
        debug!(
            "IQR bounds for '{}': Q1={:.2}, Q3={:.2}, lower={:.2}, upper={:.2}",
            column, bounds.q1, bounds.q3, bounds.lower, bounds.upper
        );
        Ok(bounds)
    }

    /// Per-row outlier mask. Null values are never outliers.
    pub fn detect(df: &DataFrame, column: &str, bounds: &IqrBounds) -> Result<Vec<bool>> {
        let series = column_series(df, column)?;
        let float_series = series.cast(&DataType::Float64)?;
        Ok(float_series
            .f64()?
            .into_iter()
            .map(|v| v.map(|val| bounds.is_outlier(val)).unwrap_or(false))
            .collect())
    }

    /// Clamp every value of `column` into `[lower, upper]`.
    ///
    /// Rows are never removed. Returns the new frame and the number of values
    /// that changed.
    pub fn cap_outliers(
        df: &DataFrame,
        column: &str,
        bounds: &IqrBounds,
    ) -> Result<(DataFrame, usize)> {
        if !(bounds.lower <= bounds.upper) {
            return Err(PipelineError::InvalidBounds {
                column: column.to_string(),
                reason: format!("lower {} exceeds upper {}", bounds.lower, bounds.upper),
            });
        }

        // Count outliers before capping
        let outliers = Self::detect(df, column, bounds)?
            .into_iter()
            .filter(|&hit| hit)
            .count();

        let series = column_series(df, column)?;
        let float_series = series.cast(&DataType::Float64)?;
        let capped = float_series
            .f64()?
            .apply(|v| v.map(|val| bounds.clamp(val)));

        let mut out = df.clone();
        out.replace(column, capped.into_series())?;

        debug!("Capped {} outliers in {}", outliers, column);
        Ok((out, outliers))
    }
}
