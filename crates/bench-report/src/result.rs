//! Per-backend benchmark results.

use crate::summary::LatencySummary;
use bench_core::ResultMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How inserts were issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertMode {
    /// Every insert awaited its confirmation.
    Confirmed,
    /// Inserts were submitted without awaiting completion.
    FireAndForget,
}

impl InsertMode {
    pub fn label(&self) -> &'static str {
        match self {
            InsertMode::Confirmed => "confirmed writes",
            InsertMode::FireAndForget => "fire-and-forget dispatch (throughput ceiling)",
        }
    }
}

impl std::fmt::Display for InsertMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertMode::Confirmed => write!(f, "confirmed"),
            InsertMode::FireAndForget => write!(f, "fire-and-forget"),
        }
    }
}

/// Outcome of one insert-throughput run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertBenchmarkResult {
    pub database: String,
    pub mode: InsertMode,
    pub target_inserts_per_second: u32,
    /// Records the loader was asked to insert
    pub total_records: u64,
    /// Rows counted in the table after the run
    pub actual_records_inserted: u64,
    /// Loader wall time
    pub total_time_seconds: f64,
    /// Sum of per-insert latencies
    pub insert_time_seconds: f64,
    /// `actual_records_inserted / total_time_seconds`, 0 when no time elapsed
    pub average_inserts_per_second: f64,
}

impl InsertBenchmarkResult {
    pub fn new(
        database: impl Into<String>,
        mode: InsertMode,
        target_inserts_per_second: u32,
        total_records: u64,
        actual_records_inserted: u64,
        total_time: Duration,
        insert_time: Duration,
    ) -> Self {
        let total_time_seconds = total_time.as_secs_f64();
        let average_inserts_per_second = if total_time_seconds > 0.0 {
            actual_records_inserted as f64 / total_time_seconds
        } else {
            0.0
        };

        Self {
            database: database.into(),
            mode,
            target_inserts_per_second,
            total_records,
            actual_records_inserted,
            total_time_seconds,
            insert_time_seconds: insert_time.as_secs_f64(),
            average_inserts_per_second,
        }
    }
}

/// Latency and result size of one timed query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuerySample {
    pub latency_seconds: f64,
    pub rows: u64,
}

impl QuerySample {
    pub fn new(latency: Duration, rows: u64) -> Self {
        Self {
            latency_seconds: latency.as_secs_f64(),
            rows,
        }
    }
}

/// Outcome of one join/watermark query run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBenchmarkResult {
    pub database: String,
    pub iterations: usize,
    pub avg_query_time_seconds: f64,
    pub avg_records_retrieved: f64,
    pub min_query_time: f64,
    pub max_query_time: f64,
    /// Sum of query latencies
    pub total_time_seconds: f64,
    /// Wall time of the whole query phase
    pub total_benchmark_time_seconds: f64,
    pub result_mode: ResultMode,
    pub samples: Vec<QuerySample>,
}

impl QueryBenchmarkResult {
    /// Reduce the samples of a run. Returns `None` when there are none.
    pub fn from_samples(
        database: impl Into<String>,
        result_mode: ResultMode,
        samples: Vec<QuerySample>,
        total_benchmark_time: Duration,
    ) -> Option<Self> {
        let summary = LatencySummary::from_secs(samples.iter().map(|s| s.latency_seconds))?;
        let total_rows: u64 = samples.iter().map(|s| s.rows).sum();

        Some(Self {
            database: database.into(),
            iterations: summary.count,
            avg_query_time_seconds: summary.avg,
            avg_records_retrieved: total_rows as f64 / summary.count as f64,
            min_query_time: summary.min,
            max_query_time: summary.max,
            total_time_seconds: summary.sum,
            total_benchmark_time_seconds: total_benchmark_time.as_secs_f64(),
            result_mode,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rate_uses_wall_time() {
        let result = InsertBenchmarkResult::new(
            "PostgreSQL",
            InsertMode::Confirmed,
            3000,
            10_000,
            10_000,
            Duration::from_secs(5),
            Duration::from_secs(40),
        );
        assert_eq!(result.average_inserts_per_second, 2000.0);
        assert_eq!(result.insert_time_seconds, 40.0);
    }

    #[test]
    fn test_insert_rate_zero_time() {
        let result = InsertBenchmarkResult::new(
            "PostgreSQL",
            InsertMode::Confirmed,
            10,
            0,
            0,
            Duration::ZERO,
            Duration::ZERO,
        );
        assert_eq!(result.average_inserts_per_second, 0.0);
    }

    #[test]
    fn test_query_result_from_samples() {
        let samples = vec![
            QuerySample::new(Duration::from_millis(100), 10),
            QuerySample::new(Duration::from_millis(300), 0),
        ];
        let result = QueryBenchmarkResult::from_samples(
            "Snowflake Hybrid Tables",
            ResultMode::Count,
            samples,
            Duration::from_millis(450),
        )
        .unwrap();

        assert_eq!(result.iterations, 2);
        assert!((result.avg_query_time_seconds - 0.2).abs() < 1e-9);
        assert_eq!(result.avg_records_retrieved, 5.0);
        assert!((result.total_time_seconds - 0.4).abs() < 1e-9);
        assert!((result.total_benchmark_time_seconds - 0.45).abs() < 1e-9);

        assert!(QueryBenchmarkResult::from_samples(
            "x",
            ResultMode::Fetch,
            Vec::new(),
            Duration::ZERO
        )
        .is_none());
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&InsertMode::FireAndForget).unwrap();
        assert_eq!(json, "\"fire_and_forget\"");
    }
}
