//! Watermark generator for the join benchmark.

use super::timestamp::generate_random_date;
use super::GeneratorError;
use bench_core::Watermark;
use chrono::{Duration, NaiveDateTime};
use rand::Rng;

/// How far back a watermark may lie.
pub const WATERMARK_LOOKBACK_DAYS: i64 = 90;

/// Generate the watermark of one partition (and pipeline).
///
/// `last_processed_date` falls within the last 90 days, excluding the most
/// recent one, and `updated_at` trails it by 1 to 60 minutes.
pub fn generate_watermark<R: Rng + ?Sized>(
    rng: &mut R,
    partition_key: &str,
    pipeline_id: Option<&str>,
    now: NaiveDateTime,
) -> Result<Watermark, GeneratorError> {
    let last_processed_date = generate_random_date(
        rng,
        now - Duration::days(WATERMARK_LOOKBACK_DAYS),
        now - Duration::days(1),
    )?;
    let updated_at = last_processed_date + Duration::minutes(rng.gen_range(1..=60));

    Ok(Watermark {
        partition_key: partition_key.to_string(),
        pipeline_id: pipeline_id.map(str::to_string),
        last_processed_date,
        updated_at,
    })
}
