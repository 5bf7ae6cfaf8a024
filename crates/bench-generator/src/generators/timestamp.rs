//! Timestamp value generators.

use super::GeneratorError;
use chrono::{Duration, NaiveDateTime};
use rand::Rng;

/// Generate a random timestamp between `start` and `end` at whole-day steps.
///
/// The result is `start` plus a uniformly drawn number of days in
/// `[0, floor((end - start) / 1 day)]`, so a zero-width range always
/// returns `start`.
pub fn generate_random_date<R: Rng + ?Sized>(
    rng: &mut R,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<NaiveDateTime, GeneratorError> {
    if start > end {
        return Err(GeneratorError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let delta_days = (end - start).num_days();
    let offset = rng.gen_range(0..=delta_days);
    Ok(start + Duration::days(offset))
}
