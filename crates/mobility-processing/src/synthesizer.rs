//! Synthetic trip generation.
//!
//! Produces the first snapshot: `record_count` independent, uniformly sampled
//! trip records with no missing or out-of-range values.

use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::Result;
use crate::types::{
    DATE, DISTANCE_KM, DISTANCE_RANGE, DURATION_MIN, DURATION_RANGE, TRANSPORT_MODE, USER_ID, ZONE,
};
use crate::utils::round_to;
use chrono::{Days, NaiveDate};
use polars::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

/// Generates the initial trip dataset.
pub struct TripSynthesizer;

impl TripSynthesizer {
    /// Generate `config.record_count` trip records from the given RNG.
    ///
    /// Columns are drawn one after another (dates, modes, distances,
    /// durations, zones, users), so the same seed always yields the same frame.
    pub fn generate<R: Rng + ?Sized>(config: &PipelineConfig, rng: &mut R) -> Result<DataFrame> {
        let n = config.record_count;
        info!("Generating {} synthetic trip records...", n);

        let calendar = Self::date_range(config.start_date, n).ok_or(
            ConfigValidationError::DateRangeOverflow {
                start: config.start_date,
                days: n,
            },
        )?;
        let dates: Vec<NaiveDate> = (0..n)
            .map(|_| *calendar.choose(rng).unwrap_or(&config.start_date))
            .collect();
        let modes = Self::draw_categories(&config.transport_modes, n, rng);
        let distances: Vec<f64> = (0..n)
            .map(|_| round_to(rng.gen_range(DISTANCE_RANGE.0..DISTANCE_RANGE.1), 2))
            .collect();
        let durations: Vec<i64> = (0..n)
            .map(|_| rng.gen_range(DURATION_RANGE.0..DURATION_RANGE.1))
            .collect();
        let zones = Self::draw_categories(&config.zones, n, rng);
        let users = Self::draw_categories(&config.users, n, rng);

        let df = df![
            DATE => dates,
            TRANSPORT_MODE => modes,
            DISTANCE_KM => distances,
            DURATION_MIN => durations,
            ZONE => zones,
            USER_ID => users,
        ]?;

        debug!("Generated dataset shape: {:?}", df.shape());
        Ok(df)
    }

    /// `days` consecutive calendar days starting at `start`, or `None` if the
    /// range runs past the last representable date.
    fn date_range(start: NaiveDate, days: usize) -> Option<Vec<NaiveDate>> {
        (0..days as u64)
            .map(|offset| start.checked_add_days(Days::new(offset)))
            .collect()
    }

    fn draw_categories<'a, R: Rng + ?Sized>(
        vocabulary: &'a [String],
        n: usize,
        rng: &mut R,
    ) -> Vec<&'a str> {
        (0..n)
            .filter_map(|_| vocabulary.choose(rng).map(String::as_str))
            .collect()
    }
}
