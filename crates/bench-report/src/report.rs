//! JSON report files.

use crate::result::{InsertBenchmarkResult, QueryBenchmarkResult};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Report of an insert-throughput run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertReport {
    /// Unix time in seconds when the report was created
    pub timestamp: f64,
    pub results: Vec<InsertBenchmarkResult>,
}

impl InsertReport {
    pub fn new(results: Vec<InsertBenchmarkResult>) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            results,
        }
    }
}

/// Report of a join benchmark run, keyed by backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowflake: Option<QueryBenchmarkResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres: Option<QueryBenchmarkResult>,
}

impl JoinReport {
    /// Results that are present, PostgreSQL first.
    pub fn results(&self) -> Vec<&QueryBenchmarkResult> {
        self.postgres.iter().chain(self.snowflake.iter()).collect()
    }
}

/// Write a report as pretty-printed JSON.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write report: {path:?}"))?;
    Ok(())
}
