//! Aggregation and comparison of benchmark results.
//!
//! Everything here is a pure reduction over results the harness already
//! produced:
//!
//! - [`LatencySummary`] reduces per-iteration latencies to count, sum,
//!   average, min and max
//! - [`compare_insert_results`] / [`compare_query_results`] pick the reference
//!   backend and compute every other backend's slowdown against it
//! - [`format`] renders console summaries and comfy-table tables
//! - [`InsertReport`] / [`JoinReport`] are the JSON files written after a
//!   successful run

pub mod compare;
pub mod format;
pub mod report;
pub mod result;
pub mod summary;

pub use compare::{
    compare_insert_results, compare_query_results, Comparison, ComparisonEntry, ComparisonMetric,
};
pub use report::{write_report, InsertReport, JoinReport};
pub use result::{InsertBenchmarkResult, InsertMode, QueryBenchmarkResult, QuerySample};
pub use summary::LatencySummary;
