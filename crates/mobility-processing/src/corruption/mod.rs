//! Deliberate corruption of a clean dataset.
//!
//! This module provides the two injectors that damage a snapshot:
//! - Null injection into `duration_min` and `user_id`
//! - Outlier injection into `distance_km`
//!
//! Both take an explicit RNG; the pipeline shares one corruption RNG between
//! them so that outlier sampling continues the null-injection stream.

mod nulls;
mod outliers;

pub use nulls::{NullInjection, NullInjector};
pub use outliers::OutlierInjector;
