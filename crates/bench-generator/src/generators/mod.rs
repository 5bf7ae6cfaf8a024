//! Individual value generators for the fields of a synthetic record.

pub mod numeric;
pub mod text;
pub mod timestamp;
pub mod uuid;
pub mod watermark;

use bench_core::BenchError;
use rand::Rng;

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Random date requested over a range whose start is after its end.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },
}

impl From<GeneratorError> for BenchError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::InvalidRange { start, end } => BenchError::InvalidRange { start, end },
        }
    }
}

/// Pick one element of a non-empty constant table.
pub(crate) fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, choices: &[T]) -> T {
    choices[rng.gen_range(0..choices.len())]
}
