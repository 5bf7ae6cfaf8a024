//! Numeric value generators.

use rand::Rng;
use rust_decimal::Decimal;

/// Generate a random integer in the given range (inclusive).
pub fn generate_int_range<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    rng.gen_range(min..=max)
}

/// Generate a random amount with 2 decimal places in `[min_cents, max_cents] / 100`.
pub fn generate_amount<R: Rng + ?Sized>(rng: &mut R, min_cents: i64, max_cents: i64) -> Decimal {
    Decimal::new(rng.gen_range(min_cents..=max_cents), 2)
}
