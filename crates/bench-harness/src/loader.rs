//! Rate-controlled insert loaders.
//!
//! [`RateControlledLoader`] issues inserts in batches of twice the
//! concurrency bound. Inside a batch a semaphore keeps at most `bound`
//! inserts in flight. After each batch the loop sleeps for whatever is left
//! of the batch's time budget (`batch_len / target_rate`). A slow backend is
//! never compensated for: the next batch does not try to catch up.

use bench_core::{Backend, BenchError};
use bench_generator::RecordGenerator;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Upper limit on concurrent inserts regardless of the target rate.
pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

/// Progress interval of the fire-and-forget loader.
const DISPATCH_PROGRESS_INTERVAL: u64 = 1000;

/// `max(1, min(target_rate, cap))`.
pub fn concurrency_bound(target_rate: u32, cap: usize) -> usize {
    (target_rate as usize).min(cap).max(1)
}

/// Sleep needed after a batch of `batch_len` inserts took `elapsed`.
///
/// `None` once the batch used up its budget of `batch_len / target_rate`
/// seconds.
pub fn pacing_delay(batch_len: usize, target_rate: u32, elapsed: Duration) -> Option<Duration> {
    if target_rate == 0 {
        return None;
    }
    let target = Duration::from_secs_f64(batch_len as f64 / f64::from(target_rate));
    target.checked_sub(elapsed).filter(|delay| !delay.is_zero())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Inserts per second to sustain
    pub target_rate: u32,
    pub total_records: u64,
    pub max_concurrency: usize,
}

impl LoaderConfig {
    pub fn new(target_rate: u32, total_records: u64) -> Self {
        Self {
            target_rate,
            total_records,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn concurrency_bound(&self) -> usize {
        concurrency_bound(self.target_rate, self.max_concurrency)
    }

    pub fn batch_size(&self) -> usize {
        2 * self.concurrency_bound()
    }
}

/// What a loader pass measured.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadMetrics {
    /// Inserts that completed (confirmed or dispatched)
    pub inserted: u64,
    /// Sum of per-insert latencies
    pub insert_time: Duration,
    /// Loader entry to exit
    pub wall_time: Duration,
    /// Paced batches; zero for fire-and-forget passes
    pub batches: u64,
}

impl LoadMetrics {
    /// Inserts per second of summed latency, as shown in progress lines.
    pub fn current_rate(&self) -> f64 {
        let secs = self.insert_time.as_secs_f64().max(0.001);
        self.inserted as f64 / secs
    }

    /// Inserts per second of wall time.
    pub fn achieved_rate(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs > 0.0 {
            self.inserted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Inserts records one by one, concurrently and paced to a target rate.
pub struct RateControlledLoader {
    backend: Arc<dyn Backend>,
    generator: Arc<RecordGenerator>,
    config: LoaderConfig,
}

impl RateControlledLoader {
    pub fn new(backend: Arc<dyn Backend>, generator: RecordGenerator, config: LoaderConfig) -> Self {
        Self {
            backend,
            generator: Arc::new(generator),
            config,
        }
    }

    /// Insert `total_records` records. The first failed insert aborts the pass.
    pub async fn run(&self) -> Result<LoadMetrics, BenchError> {
        let start = Instant::now();
        let bound = self.config.concurrency_bound();
        let batch_size = self.config.batch_size() as u64;
        let gate = Arc::new(Semaphore::new(bound));
        let mut metrics = LoadMetrics::default();

        info!(
            "Inserting {} records into {} at {} inserts/second (concurrency {}, batch {})",
            self.config.total_records,
            self.backend.name(),
            self.config.target_rate,
            bound,
            batch_size
        );

        let mut next_index = 0u64;
        while next_index < self.config.total_records {
            let batch_len = batch_size.min(self.config.total_records - next_index);
            let batch_start = Instant::now();

            let mut tasks = JoinSet::new();
            for index in next_index..next_index + batch_len {
                let backend = Arc::clone(&self.backend);
                let generator = Arc::clone(&self.generator);
                let gate = Arc::clone(&gate);
                tasks.spawn(async move {
                    let _permit = gate.acquire_owned().await.map_err(|_| {
                        BenchError::operation(backend.name(), "admission gate closed")
                    })?;
                    let record = generator.record_at(index);
                    backend.insert_one(&record).await
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let latency = match joined {
                    Ok(Ok(latency)) => latency,
                    Ok(Err(e)) => {
                        tasks.abort_all();
                        return Err(e);
                    }
                    Err(e) => {
                        tasks.abort_all();
                        return Err(BenchError::operation(self.backend.name(), e));
                    }
                };
                metrics.inserted += 1;
                metrics.insert_time += latency;
            }

            next_index += batch_len;
            metrics.batches += 1;

            info!(
                "Inserted {}/{} records ({:.1}%), current rate: {:.2} records/second",
                metrics.inserted,
                self.config.total_records,
                metrics.inserted as f64 * 100.0 / self.config.total_records as f64,
                metrics.current_rate()
            );

            if let Some(delay) =
                pacing_delay(batch_len as usize, self.config.target_rate, batch_start.elapsed())
            {
                debug!("Batch {} ahead of target, sleeping {:?}", metrics.batches, delay);
                tokio::time::sleep(delay).await;
            }
        }

        metrics.wall_time = start.elapsed();
        info!(
            "Insert pass complete: {} records in {:?} ({:.2} records/second)",
            metrics.inserted,
            metrics.wall_time,
            metrics.achieved_rate()
        );
        Ok(metrics)
    }
}

/// Submits every insert without awaiting its completion.
///
/// Records are generated up front so the timed span covers dispatch only.
/// The span runs from the first dispatch to the return of the last one; the
/// resulting rate is a dispatch ceiling, not a confirmed-write rate.
pub struct FireAndForgetLoader {
    backend: Arc<dyn Backend>,
    generator: RecordGenerator,
    total_records: u64,
}

impl FireAndForgetLoader {
    pub fn new(backend: Arc<dyn Backend>, generator: RecordGenerator, total_records: u64) -> Self {
        Self {
            backend,
            generator,
            total_records,
        }
    }

    pub async fn run(&self) -> Result<LoadMetrics, BenchError> {
        let dispatcher =
            self.backend
                .fire_and_forget()
                .ok_or_else(|| BenchError::Unsupported {
                    backend: self.backend.name().to_string(),
                    capability: "fire-and-forget inserts".to_string(),
                })?;

        let records: Vec<_> = (0..self.total_records)
            .map(|i| self.generator.record_at(i))
            .collect();
        info!(
            "Generated {} records, dispatching to {} without awaiting completion",
            records.len(),
            self.backend.name()
        );

        let mut metrics = LoadMetrics::default();
        let mut first_dispatch: Option<Instant> = None;
        for record in &records {
            first_dispatch.get_or_insert_with(Instant::now);
            dispatcher.dispatch_insert(record).await?;
            metrics.inserted += 1;

            if metrics.inserted % DISPATCH_PROGRESS_INTERVAL == 0 {
                info!(
                    "Dispatched {}/{} records",
                    metrics.inserted, self.total_records
                );
            }
        }

        metrics.wall_time = first_dispatch.map(|t| t.elapsed()).unwrap_or_default();
        metrics.insert_time = metrics.wall_time;
        info!(
            "Dispatched {} records in {:?} ({:.2} records/second, unconfirmed)",
            metrics.inserted,
            metrics.wall_time,
            metrics.achieved_rate()
        );
        Ok(metrics)
    }
}
