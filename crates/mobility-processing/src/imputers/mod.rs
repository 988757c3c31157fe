//! Imputation module for handling missing values.
//!
//! Numeric columns are filled with their median, categorical columns with
//! their mode.

mod statistical;

pub use statistical::{StatisticalImputer, TripImputation};
