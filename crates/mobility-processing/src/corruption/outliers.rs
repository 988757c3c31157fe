//! Outlier injection.

use crate::error::Result;
use crate::utils::{column_series, row_mask, sample_rows};
use polars::prelude::*;
use rand::Rng;
use tracing::info;

/// Creates artificially extreme values in a numeric column.
pub struct OutlierInjector;

impl OutlierInjector {
    /// Multiply a uniformly sampled `round(fraction × N)` subset of `column`
    /// by `factor`.
    ///
    /// Returns the new frame (the column becomes `Float64`) and the
    /// multiplied row indices.
    pub fn inject<R: Rng + ?Sized>(
        df: &DataFrame,
        column: &str,
        fraction: f64,
        factor: f64,
        rng: &mut R,
    ) -> Result<(DataFrame, Vec<usize>)> {
        let series = column_series(df, column)?;
        let rows = sample_rows(rng, df.height(), fraction);
        let mask = row_mask(df.height(), &rows);

        let float_series = series.cast(&DataType::Float64)?;
        let scaled: Vec<Option<f64>> = float_series
            .f64()?
            .into_iter()
            .zip(mask)
            .map(|(v, hit)| if hit { v.map(|val| val * factor) } else { v })
            .collect();

        let mut out = df.clone();
        out.replace(column, Series::new(column.into(), scaled))?;

        info!(
            "Injected {} outliers into '{}' (x{})",
            rows.len(),
            column,
            factor
        );
        Ok((out, rows))
    }
}
