//! Latency reduction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Count, sum, average, min and max of a latency sequence, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: usize,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl LatencySummary {
    /// Summarize `samples`. Returns `None` for an empty sequence.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        Self::from_secs(samples.iter().map(Duration::as_secs_f64))
    }

    pub fn from_secs(samples: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut iter = samples.into_iter();
        let first = iter.next()?;

        let (count, sum, min, max) = iter.fold((1usize, first, first, first), |acc, s| {
            (acc.0 + 1, acc.1 + s, acc.2.min(s), acc.3.max(s))
        });

        Some(Self {
            count,
            sum,
            avg: sum / count as f64,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_summary() {
        assert!(LatencySummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_summary() {
        let samples = [
            Duration::from_millis(300),
            Duration::from_millis(100),
            Duration::from_millis(200),
        ];
        let summary = LatencySummary::from_samples(&samples).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.sum - 0.6).abs() < 1e-9);
        assert!((summary.avg - 0.2).abs() < 1e-9);
        assert!((summary.min - 0.1).abs() < 1e-9);
        assert!((summary.max - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_single_sample() {
        let summary = LatencySummary::from_secs([0.5]).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.min, summary.max);
        assert_eq!(summary.avg, 0.5);
    }
}
