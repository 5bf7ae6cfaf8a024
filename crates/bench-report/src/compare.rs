//! Relative comparison of backends.

use crate::result::{InsertBenchmarkResult, QueryBenchmarkResult};
use serde::{Deserialize, Serialize};

/// What a comparison ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// Achieved inserts per second; higher is better.
    InsertRate,
    /// Average query latency in seconds; lower is better.
    QueryLatency,
}

impl ComparisonMetric {
    fn higher_is_better(self) -> bool {
        matches!(self, ComparisonMetric::InsertRate)
    }
}

/// One backend's standing against the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub database: String,
    pub value: f64,
    pub is_reference: bool,
    /// Percent slower than the reference; `None` when undefined.
    pub slowdown_pct: Option<f64>,
    /// How many times faster the reference is; `None` when undefined.
    pub speedup: Option<f64>,
}

/// Backends ranked against the best one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub metric: ComparisonMetric,
    pub reference: String,
    /// In input order.
    pub entries: Vec<ComparisonEntry>,
}

impl Comparison {
    pub fn entry(&self, database: &str) -> Option<&ComparisonEntry> {
        self.entries.iter().find(|e| e.database == database)
    }

    fn build(metric: ComparisonMetric, values: Vec<(String, f64)>) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }

        // First best value wins ties.
        let mut best = 0;
        for (i, (_, value)) in values.iter().enumerate().skip(1) {
            let better = if metric.higher_is_better() {
                *value > values[best].1
            } else {
                *value < values[best].1
            };
            if better {
                best = i;
            }
        }
        let reference_value = values[best].1;

        let entries = values
            .iter()
            .enumerate()
            .map(|(i, (database, value))| {
                // Slower value over faster value, as a speedup factor.
                let (slow, fast) = if metric.higher_is_better() {
                    (reference_value, *value)
                } else {
                    (*value, reference_value)
                };
                let speedup = (fast > 0.0).then(|| slow / fast);

                ComparisonEntry {
                    database: database.clone(),
                    value: *value,
                    is_reference: i == best,
                    slowdown_pct: speedup.map(|s| (s - 1.0) * 100.0),
                    speedup,
                }
            })
            .collect();

        Some(Self {
            metric,
            reference: values[best].0.clone(),
            entries,
        })
    }
}

/// Rank insert runs by achieved rate. `None` with fewer than two results.
pub fn compare_insert_results(results: &[InsertBenchmarkResult]) -> Option<Comparison> {
    Comparison::build(
        ComparisonMetric::InsertRate,
        results
            .iter()
            .map(|r| (r.database.clone(), r.average_inserts_per_second))
            .collect(),
    )
}

/// Rank query runs by average latency. `None` with fewer than two results.
pub fn compare_query_results(results: &[&QueryBenchmarkResult]) -> Option<Comparison> {
    Comparison::build(
        ComparisonMetric::QueryLatency,
        results
            .iter()
            .map(|r| (r.database.clone(), r.avg_query_time_seconds))
            .collect(),
    )
}
