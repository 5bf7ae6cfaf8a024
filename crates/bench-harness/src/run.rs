//! Complete benchmark runs against one backend.
//!
//! Both run functions close the backend before returning, whether the run
//! succeeded or not. A failure in the run takes precedence over a failure
//! to close.

use crate::loader::{FireAndForgetLoader, LoaderConfig, RateControlledLoader};
use crate::workload::{JoinConfig, JoinWorkload};
use bench_core::{Backend, BenchError, SchemaSpec};
use bench_generator::RecordGenerator;
use bench_report::{InsertBenchmarkResult, InsertMode, QueryBenchmarkResult};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct InsertRunConfig {
    pub loader: LoaderConfig,
    /// Requested mode; fire-and-forget falls back to confirmed inserts on
    /// backends without native support.
    pub mode: InsertMode,
    pub seed: Option<u64>,
}

impl InsertRunConfig {
    pub fn new(loader: LoaderConfig) -> Self {
        Self {
            loader,
            mode: InsertMode::Confirmed,
            seed: None,
        }
    }

    pub fn with_mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// Recreate the transactions table, run one loader pass and count the rows.
pub async fn run_insert_benchmark(
    backend: Arc<dyn Backend>,
    config: &InsertRunConfig,
) -> Result<InsertBenchmarkResult, BenchError> {
    let outcome = insert_pass(&backend, config).await;
    let closed = backend.close().await;
    let result = outcome?;
    closed?;
    Ok(result)
}

async fn insert_pass(
    backend: &Arc<dyn Backend>,
    config: &InsertRunConfig,
) -> Result<InsertBenchmarkResult, BenchError> {
    info!("Setting up {} table...", backend.name());
    backend.setup_schema(SchemaSpec::Transactions).await?;

    let mode = match config.mode {
        InsertMode::FireAndForget if backend.fire_and_forget().is_none() => {
            warn!(
                "{} does not support fire-and-forget inserts, using confirmed inserts",
                backend.name()
            );
            InsertMode::Confirmed
        }
        mode => mode,
    };

    info!(
        "Starting {} benchmark with target: {} inserts/second ({})",
        backend.name(),
        config.loader.target_rate,
        mode.label()
    );
    let generator = RecordGenerator::new(config.seed);
    let metrics = match mode {
        InsertMode::Confirmed => {
            RateControlledLoader::new(Arc::clone(backend), generator, config.loader)
                .run()
                .await?
        }
        InsertMode::FireAndForget => {
            FireAndForgetLoader::new(Arc::clone(backend), generator, config.loader.total_records)
                .run()
                .await?
        }
    };

    let actual = backend.count_rows().await?;
    if mode == InsertMode::Confirmed && actual != metrics.inserted {
        warn!(
            "{} reports {} rows after {} confirmed inserts",
            backend.name(),
            actual,
            metrics.inserted
        );
    }

    Ok(InsertBenchmarkResult::new(
        backend.name(),
        mode,
        config.loader.target_rate,
        config.loader.total_records,
        actual,
        metrics.wall_time,
        metrics.insert_time,
    ))
}

/// Seed the join tables, time the query phase and summarize it.
pub async fn run_join_benchmark(
    backend: &dyn Backend,
    config: &JoinConfig,
) -> Result<QueryBenchmarkResult, BenchError> {
    let outcome = JoinWorkload::new(backend, config).run().await;
    let closed = backend.close().await;
    let outcome = outcome?;
    closed?;

    QueryBenchmarkResult::from_samples(
        backend.name(),
        config.result_mode,
        outcome.samples,
        outcome.query_phase,
    )
    .ok_or_else(|| BenchError::NoWorkloadData("no query iterations were run".to_string()))
}
