//! In-process backend for exercising the drivers without a database.

use async_trait::async_trait;
use bench_core::{
    Backend, BackendKind, BenchError, BusinessRecord, FireAndForget, QueryParams, SchemaSpec,
    SyntheticRecord, Watermark, WatermarkLayout, WatermarkUniverse,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct MemoryState {
    /// Ids of inserted transactions
    transactions: Vec<u128>,
    business: Vec<BusinessRecord>,
    watermarks: Vec<Watermark>,
}

/// A [`Backend`] that keeps every table in memory.
///
/// Latency, failures and fire-and-forget support are configurable, and the
/// backend records how it was driven (insert calls, peak concurrency,
/// closes) for assertions.
pub struct MemoryBackend {
    name: String,
    kind: BackendKind,
    state: Mutex<MemoryState>,
    insert_latency: Duration,
    query_latency: Duration,
    lookup_latency: Duration,
    fail_insert_at: Option<u64>,
    fail_setup: bool,
    supports_fire_and_forget: bool,
    insert_calls: AtomicU64,
    dispatches: AtomicU64,
    queries: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    close_calls: AtomicU64,
    closed: AtomicBool,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BackendKind::Relational,
            state: Mutex::new(MemoryState::default()),
            insert_latency: Duration::ZERO,
            query_latency: Duration::ZERO,
            lookup_latency: Duration::ZERO,
            fail_insert_at: None,
            fail_setup: false,
            supports_fire_and_forget: false,
            insert_calls: AtomicU64::new(0),
            dispatches: AtomicU64::new(0),
            queries: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            close_calls: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Behave like an analytical backend that accepts fire-and-forget inserts.
    pub fn analytical(mut self) -> Self {
        self.kind = BackendKind::Analytical;
        self.supports_fire_and_forget = true;
        self
    }

    pub fn with_insert_latency(mut self, latency: Duration) -> Self {
        self.insert_latency = latency;
        self
    }

    pub fn with_query_latency(mut self, latency: Duration) -> Self {
        self.query_latency = latency;
        self
    }

    /// Delay for the DISTINCT partition/pipeline lookup.
    pub fn with_lookup_latency(mut self, latency: Duration) -> Self {
        self.lookup_latency = latency;
        self
    }

    /// Fail the `n`-th insert call (1-based).
    pub fn fail_insert_at(mut self, n: u64) -> Self {
        self.fail_insert_at = Some(n);
        self
    }

    pub fn fail_setup(mut self) -> Self {
        self.fail_setup = true;
        self
    }

    pub fn insert_calls(&self) -> u64 {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Highest number of inserts that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> u64 {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn business_rows(&self) -> Vec<BusinessRecord> {
        self.lock().business.clone()
    }

    pub fn watermarks(&self) -> Vec<Watermark> {
        self.lock().watermarks.clone()
    }

    /// Replace the watermark table.
    pub fn set_watermarks(&self, watermarks: Vec<Watermark>) {
        self.lock().watermarks = watermarks;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<(), BenchError> {
        if self.is_closed() {
            return Err(BenchError::Closed(self.name.clone()));
        }
        Ok(())
    }

    /// Rows of the partition newer than each matching watermark.
    fn matching_rows(&self, params: &QueryParams) -> u64 {
        let state = self.lock();
        state
            .watermarks
            .iter()
            .filter(|wm| wm.partition_key == params.partition_key)
            .filter(|wm| match &params.pipeline_id {
                Some(pipeline) => wm.pipeline_id.as_ref() == Some(pipeline),
                None => true,
            })
            .map(|wm| {
                state
                    .business
                    .iter()
                    .filter(|row| row.partition_key == params.partition_key)
                    .filter(|row| row.transaction_date > wm.last_processed_date)
                    .count() as u64
            })
            .sum()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn setup_schema(&self, spec: SchemaSpec) -> Result<(), BenchError> {
        self.ensure_open()?;
        if self.fail_setup {
            return Err(BenchError::setup(&self.name, "schema setup rejected"));
        }
        let mut state = self.lock();
        match spec {
            SchemaSpec::Transactions => state.transactions.clear(),
            SchemaSpec::Join(_) => {
                state.business.clear();
                state.watermarks.clear();
            }
        }
        Ok(())
    }

    async fn insert_one(&self, record: &SyntheticRecord) -> Result<Duration, BenchError> {
        self.ensure_open()?;
        let call = self.insert_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let start = Instant::now();
        if !self.insert_latency.is_zero() {
            tokio::time::sleep(self.insert_latency).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_insert_at == Some(call) {
            return Err(BenchError::operation(
                &self.name,
                format!("insert {call} rejected"),
            ));
        }
        self.lock().transactions.push(record.id.as_u128());
        Ok(start.elapsed())
    }

    async fn insert_business_batch(&self, rows: &[BusinessRecord]) -> Result<u64, BenchError> {
        self.ensure_open()?;
        self.lock().business.extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn insert_watermarks(&self, watermarks: &[Watermark]) -> Result<u64, BenchError> {
        self.ensure_open()?;
        self.lock().watermarks.extend_from_slice(watermarks);
        Ok(watermarks.len() as u64)
    }

    async fn watermark_universe(
        &self,
        layout: WatermarkLayout,
    ) -> Result<WatermarkUniverse, BenchError> {
        self.ensure_open()?;
        if !self.lookup_latency.is_zero() {
            tokio::time::sleep(self.lookup_latency).await;
        }
        let state = self.lock();
        let partitions: BTreeSet<String> = state
            .watermarks
            .iter()
            .map(|wm| wm.partition_key.clone())
            .collect();
        let pipelines: BTreeSet<String> = match layout {
            WatermarkLayout::Single => BTreeSet::new(),
            WatermarkLayout::MultiPipeline => state
                .watermarks
                .iter()
                .filter_map(|wm| wm.pipeline_id.clone())
                .collect(),
        };
        Ok(WatermarkUniverse {
            partitions: partitions.into_iter().collect(),
            pipelines: pipelines.into_iter().collect(),
        })
    }

    async fn run_query(&self, params: &QueryParams) -> Result<(u64, Duration), BenchError> {
        self.ensure_open()?;
        self.queries.fetch_add(1, Ordering::SeqCst);

        let start = Instant::now();
        if !self.query_latency.is_zero() {
            tokio::time::sleep(self.query_latency).await;
        }
        let rows = self.matching_rows(params);
        Ok((rows, start.elapsed()))
    }

    async fn count_rows(&self) -> Result<u64, BenchError> {
        self.ensure_open()?;
        Ok(self.lock().transactions.len() as u64)
    }

    async fn close(&self) -> Result<(), BenchError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn fire_and_forget(&self) -> Option<&dyn FireAndForget> {
        if self.supports_fire_and_forget {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl FireAndForget for MemoryBackend {
    async fn dispatch_insert(&self, record: &SyntheticRecord) -> Result<(), BenchError> {
        self.ensure_open()?;
        let call = self.dispatches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_insert_at == Some(call) {
            return Err(BenchError::operation(
                &self.name,
                format!("dispatch {call} rejected"),
            ));
        }
        self.lock().transactions.push(record.id.as_u128());
        Ok(())
    }
}
