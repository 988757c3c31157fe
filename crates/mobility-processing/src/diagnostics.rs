//! Before/after diagnostics of a snapshot.
//!
//! These are the data behind the comparison plots: a per-cell null map (the
//! null heatmap) and a per-row outlier classification (the distance scatter).
//! Rendering is left to whatever consumes them.

use crate::error::Result;
use crate::pipeline::outliers::{IqrBounds, OutlierHandler};
use crate::utils::column_series;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Null mask of every column of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullMap {
    pub columns: Vec<String>,
    pub rows: usize,
    /// `cells[c][r]` is true when row `r` of column `c` is null.
    pub cells: Vec<Vec<bool>>,
}

impl NullMap {
    pub fn from_frame(df: &DataFrame) -> Self {
        let mut columns = Vec::with_capacity(df.width());
        let mut cells = Vec::with_capacity(df.width());
        for col in df.get_columns() {
            columns.push(col.name().to_string());
            let mask = col.as_materialized_series().is_null();
            cells.push(mask.into_iter().map(|v| v.unwrap_or(false)).collect::<Vec<bool>>());
        }
        Self {
            columns,
            rows: df.height(),
            cells,
        }
    }

    /// Null count per column, in column order.
    pub fn column_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .zip(&self.cells)
            .map(|(name, mask)| (name.clone(), mask.iter().filter(|&&null| null).count()))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().filter(|&&null| null).count()
    }

    /// Row indices with at least one null.
    pub fn rows_with_nulls(&self) -> Vec<usize> {
        (0..self.rows)
            .filter(|&r| self.cells.iter().any(|mask| mask[r]))
            .collect()
    }
}

/// One point of the distance scatter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub index: usize,
    pub value: f64,
    pub is_outlier: bool,
}

/// Row-indexed values of a numeric column, classified against IQR bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierScatter {
    pub column: String,
    pub bounds: IqrBounds,
    pub points: Vec<ScatterPoint>,
}

impl OutlierScatter {
    /// Null values are skipped; indices stay those of the frame.
    pub fn from_frame(df: &DataFrame, column: &str, bounds: &IqrBounds) -> Result<Self> {
        let mask = OutlierHandler::detect(df, column, bounds)?;
        let float_series = column_series(df, column)?.cast(&DataType::Float64)?;
        let points = float_series
            .f64()?
            .into_iter()
            .zip(mask)
            .enumerate()
            .filter_map(|(index, (value, is_outlier))| {
                value.map(|value| ScatterPoint {
                    index,
                    value,
                    is_outlier,
                })
            })
            .collect();

        Ok(Self {
            column: column.to_string(),
            bounds: *bounds,
            points,
        })
    }

    pub fn outlier_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_outlier).count()
    }

    pub fn outlier_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .filter(|p| p.is_outlier)
            .map(|p| p.index)
            .collect()
    }
}
