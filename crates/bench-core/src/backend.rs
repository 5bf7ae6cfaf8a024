//! Capability traits implemented by every benchmarked backend.

use crate::error::BenchError;
use crate::query::QueryParams;
use crate::record::{BusinessRecord, SyntheticRecord};
use crate::watermark::{Watermark, WatermarkLayout, WatermarkUniverse};
use async_trait::async_trait;
use std::time::Duration;

/// Connection model of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Row store reached through a pool of concurrent connections.
    Relational,
    /// Distributed analytical store reached through one shared session.
    Analytical,
}

/// Which tables `setup_schema` must (re)create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSpec {
    /// The single transactions table of the insert benchmark.
    Transactions,
    /// Business data plus watermarks for the join benchmark.
    Join(WatermarkLayout),
}

/// Operations the loader and the workload driver run against a backend.
///
/// Reported durations cover only the network and execution span of the
/// operation. Time spent waiting for a connection or for the adapter's own
/// admission control is never included.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Display name used in results.
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Drop and recreate the tables of `spec`.
    ///
    /// Failures are [`BenchError::Setup`] and abort the run.
    async fn setup_schema(&self, spec: SchemaSpec) -> Result<(), BenchError>;

    /// Write exactly one record and report how long the write took.
    async fn insert_one(&self, record: &SyntheticRecord) -> Result<Duration, BenchError>;

    /// Bulk insert business rows. Used for seeding only, never timed.
    async fn insert_business_batch(&self, rows: &[BusinessRecord]) -> Result<u64, BenchError>;

    /// Bulk insert watermark rows. Used for seeding only, never timed.
    async fn insert_watermarks(&self, watermarks: &[Watermark]) -> Result<u64, BenchError>;

    /// Distinct partitions (and, for the multi-pipeline layout, pipelines)
    /// present in the watermark table.
    async fn watermark_universe(
        &self,
        layout: WatermarkLayout,
    ) -> Result<WatermarkUniverse, BenchError>;

    /// Execute one join query and report the result size and its duration,
    /// measured from dispatch through full materialization.
    async fn run_query(&self, params: &QueryParams) -> Result<(u64, Duration), BenchError>;

    /// Current row count of the transactions table.
    async fn count_rows(&self) -> Result<u64, BenchError>;

    /// Release all held connections. Calling it again is a no-op.
    async fn close(&self) -> Result<(), BenchError>;

    /// Fire-and-forget submission, when the client supports it natively.
    fn fire_and_forget(&self) -> Option<&dyn FireAndForget> {
        None
    }
}

/// Submission of writes without awaiting their completion.
///
/// Rates measured through this trait are dispatch throughput ceilings,
/// not confirmed-write rates.
#[async_trait]
pub trait FireAndForget: Send + Sync {
    /// Submit one insert. Returns once the backend accepted the statement.
    async fn dispatch_insert(&self, record: &SyntheticRecord) -> Result<(), BenchError>;
}
