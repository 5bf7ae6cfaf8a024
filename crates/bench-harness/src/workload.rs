//! Join/watermark workload.
//!
//! Seeds business rows spread over `num_partitions` partitions and one
//! watermark per partition (or per partition and pipeline), then times
//! `num_iterations` sequential executions of "rows in this partition newer
//! than its watermark" against randomly chosen partitions.

use bench_core::{
    partition_key, pipeline_id, Backend, BenchError, QueryParams, ResultMode, SchemaSpec,
    WatermarkLayout,
};
use bench_generator::{generate_watermark, RecordGenerator, TransactionWindow};
use bench_report::QuerySample;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::info;

/// Largest bulk insert used while seeding business rows.
pub const SEED_BATCH_SIZE: u64 = 1000;

// Independent RNG streams derived from the run seed.
const WATERMARK_STREAM: u64 = 0x5741_5445_524D_4B53;
const QUERY_STREAM: u64 = 0x5155_4552_5953_4545;

#[derive(Debug, Clone)]
pub struct JoinConfig {
    pub num_business_records: u64,
    pub num_partitions: u32,
    pub num_pipelines: u32,
    pub num_iterations: usize,
    pub result_mode: ResultMode,
    pub seed: Option<u64>,
    /// Window business transaction dates are drawn from
    pub window: Option<TransactionWindow>,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            num_business_records: 10_000,
            num_partitions: 10,
            num_pipelines: 5,
            num_iterations: 10,
            result_mode: ResultMode::Fetch,
            seed: None,
            window: None,
        }
    }
}

impl JoinConfig {
    pub fn layout(&self) -> WatermarkLayout {
        WatermarkLayout::for_pipelines(self.num_pipelines)
    }

    pub fn partitions(&self) -> Vec<String> {
        (1..=self.num_partitions).map(partition_key).collect()
    }
}

/// What one workload run seeded and measured.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub business_rows: u64,
    pub watermarks: u64,
    pub samples: Vec<QuerySample>,
    /// Wall time of the query phase, including the partition/pipeline lookup
    pub query_phase: Duration,
}

fn stream_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ stream),
        None => StdRng::from_entropy(),
    }
}

/// Drives one join benchmark against a backend.
pub struct JoinWorkload<'a> {
    backend: &'a dyn Backend,
    config: &'a JoinConfig,
    generator: RecordGenerator,
}

impl<'a> JoinWorkload<'a> {
    pub fn new(backend: &'a dyn Backend, config: &'a JoinConfig) -> Self {
        let mut generator = RecordGenerator::new(config.seed);
        if let Some(window) = config.window {
            generator = generator.with_window(window);
        }
        Self {
            backend,
            config,
            generator,
        }
    }

    /// Recreate the tables, seed them and run the timed query phase.
    pub async fn run(&self) -> Result<JoinOutcome, BenchError> {
        let layout = self.config.layout();
        info!("Setting up {} tables for watermarks benchmark...", self.backend.name());
        self.backend.setup_schema(SchemaSpec::Join(layout)).await?;

        let business_rows = self.seed_business().await?;
        let watermarks = self.seed_watermarks().await?;
        let (samples, query_phase) = self.run_queries().await?;

        Ok(JoinOutcome {
            business_rows,
            watermarks,
            samples,
            query_phase,
        })
    }

    /// Bulk insert business rows in batches of at most [`SEED_BATCH_SIZE`].
    pub async fn seed_business(&self) -> Result<u64, BenchError> {
        let partitions = self.config.partitions();
        let total = self.config.num_business_records;
        let mut inserted = 0;
        let mut next_index = 0;

        while next_index < total {
            let batch_len = SEED_BATCH_SIZE.min(total - next_index);
            let rows: Vec<_> = (next_index..next_index + batch_len)
                .filter_map(|i| self.generator.business_record_at(i, &partitions))
                .collect();
            if rows.is_empty() {
                break;
            }
            inserted += self.backend.insert_business_batch(&rows).await?;
            next_index += batch_len;
            info!("Generated {}/{} business records", next_index, total);
        }
        Ok(inserted)
    }

    /// One watermark per partition, or per partition and pipeline.
    pub async fn seed_watermarks(&self) -> Result<u64, BenchError> {
        let mut rng = stream_rng(self.config.seed, WATERMARK_STREAM);
        let now = Utc::now().naive_utc();

        let mut watermarks = Vec::new();
        for partition in self.config.partitions() {
            match self.config.layout() {
                WatermarkLayout::Single => {
                    watermarks.push(generate_watermark(&mut rng, &partition, None, now)?)
                }
                WatermarkLayout::MultiPipeline => {
                    for n in 1..=self.config.num_pipelines {
                        let pipeline = pipeline_id(n);
                        watermarks.push(generate_watermark(
                            &mut rng,
                            &partition,
                            Some(&pipeline),
                            now,
                        )?);
                    }
                }
            }
        }

        let inserted = self.backend.insert_watermarks(&watermarks).await?;
        info!("Generated {} watermarks", inserted);
        Ok(inserted)
    }

    /// Time `num_iterations` queries, one after another.
    ///
    /// The phase clock starts before the DISTINCT partition/pipeline lookup.
    /// Fails with [`BenchError::NoWorkloadData`] before any query runs when
    /// the watermark table holds no partitions (or no pipelines).
    pub async fn run_queries(&self) -> Result<(Vec<QuerySample>, Duration), BenchError> {
        let layout = self.config.layout();
        info!("Starting {} query benchmark...", self.backend.name());
        let phase_start = Instant::now();
        let universe = self.backend.watermark_universe(layout).await?;
        if universe.is_empty(layout) {
            return Err(BenchError::NoWorkloadData(format!(
                "no watermark partitions found in {}",
                self.backend.name()
            )));
        }

        let mut rng = stream_rng(self.config.seed, QUERY_STREAM);
        let iterations = self.config.num_iterations;
        let mut samples = Vec::with_capacity(iterations);
        for i in 0..iterations {
            let partition = universe.partitions[rng.gen_range(0..universe.partitions.len())].clone();
            let pipeline = match layout {
                WatermarkLayout::Single => None,
                WatermarkLayout::MultiPipeline => {
                    Some(universe.pipelines[rng.gen_range(0..universe.pipelines.len())].clone())
                }
            };
            let params = QueryParams::new(partition, pipeline).with_mode(self.config.result_mode);

            let (rows, latency) = self.backend.run_query(&params).await?;
            info!(
                "Iteration {}/{}: retrieved {} records in {:.4} seconds",
                i + 1,
                iterations,
                rows,
                latency.as_secs_f64()
            );
            samples.push(QuerySample::new(latency, rows));
        }

        Ok((samples, phase_start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;
    use bench_core::Watermark;
    use chrono::NaiveDate;

    fn window_2020() -> TransactionWindow {
        let day = |m, d| {
            NaiveDate::from_ymd_opt(2020, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        TransactionWindow::new(day(1, 1), day(12, 31)).unwrap()
    }

    #[tokio::test]
    async fn test_single_pipeline_scenario() {
        let backend = MemoryBackend::new("memory");
        let config = JoinConfig {
            num_business_records: 1000,
            num_partitions: 10,
            num_pipelines: 1,
            num_iterations: 10,
            seed: Some(11),
            ..Default::default()
        };

        let outcome = JoinWorkload::new(&backend, &config).run().await.unwrap();
        assert_eq!(outcome.business_rows, 1000);
        assert_eq!(outcome.watermarks, 10);
        assert_eq!(outcome.samples.len(), 10);
        for sample in &outcome.samples {
            assert!(sample.rows <= 1000);
            assert!(sample.latency_seconds >= 0.0);
        }
        assert!(backend.watermarks().iter().all(|w| w.pipeline_id.is_none()));
    }

    #[tokio::test]
    async fn test_zero_qualifying_rows() {
        // every transaction predates every watermark
        let backend = MemoryBackend::new("memory");
        let config = JoinConfig {
            num_business_records: 1000,
            num_partitions: 10,
            num_pipelines: 1,
            num_iterations: 10,
            result_mode: ResultMode::Count,
            seed: Some(12),
            window: Some(window_2020()),
        };

        let outcome = JoinWorkload::new(&backend, &config).run().await.unwrap();
        assert_eq!(outcome.samples.len(), 10);
        assert!(outcome.samples.iter().all(|s| s.rows == 0));
    }

    #[tokio::test]
    async fn test_multi_pipeline_watermarks() {
        let backend = MemoryBackend::new("memory");
        let config = JoinConfig {
            num_business_records: 200,
            num_partitions: 4,
            num_pipelines: 3,
            num_iterations: 5,
            seed: Some(13),
            ..Default::default()
        };

        let outcome = JoinWorkload::new(&backend, &config).run().await.unwrap();
        assert_eq!(outcome.watermarks, 12);
        let watermarks = backend.watermarks();
        assert!(watermarks.iter().all(|w| w.pipeline_id.is_some()));
        assert!(watermarks
            .iter()
            .all(|w| w.updated_at > w.last_processed_date));
        assert_eq!(backend.queries(), 5);
    }

    #[tokio::test]
    async fn test_no_partitions_fails_before_timing() {
        let backend = MemoryBackend::new("memory");
        let config = JoinConfig {
            num_business_records: 100,
            num_partitions: 0,
            num_pipelines: 1,
            num_iterations: 10,
            ..Default::default()
        };

        let result = JoinWorkload::new(&backend, &config).run().await;
        assert!(matches!(result, Err(BenchError::NoWorkloadData(_))));
        assert_eq!(backend.queries(), 0);
    }

    #[tokio::test]
    async fn test_query_phase_includes_universe_lookup() {
        let backend = MemoryBackend::new("memory").with_lookup_latency(Duration::from_millis(50));
        let config = JoinConfig {
            num_business_records: 20,
            num_partitions: 2,
            num_pipelines: 1,
            num_iterations: 1,
            seed: Some(15),
            ..Default::default()
        };

        let outcome = JoinWorkload::new(&backend, &config).run().await.unwrap();
        assert_eq!(outcome.samples.len(), 1);
        assert!(outcome.query_phase >= Duration::from_millis(50));
        assert!(outcome.samples[0].latency_seconds < 0.05);
    }

    #[tokio::test]
    async fn test_missing_pipelines_is_no_workload() {
        let backend = MemoryBackend::new("memory");
        let config = JoinConfig {
            num_pipelines: 2,
            ..Default::default()
        };
        let ts = Utc::now().naive_utc();
        backend.set_watermarks(vec![Watermark::new("partition_1", None, ts, ts).unwrap()]);

        let result = JoinWorkload::new(&backend, &config).run_queries().await;
        assert!(matches!(result, Err(BenchError::NoWorkloadData(_))));
    }

    #[tokio::test]
    async fn test_seeded_runs_pick_the_same_partitions() {
        let config = JoinConfig {
            num_business_records: 50,
            num_partitions: 5,
            num_pipelines: 1,
            num_iterations: 8,
            seed: Some(14),
            window: Some(window_2020()),
            ..Default::default()
        };

        let first = MemoryBackend::new("a");
        let second = MemoryBackend::new("b");
        let a = JoinWorkload::new(&first, &config).run().await.unwrap();
        let b = JoinWorkload::new(&second, &config).run().await.unwrap();

        let rows = |o: &JoinOutcome| o.samples.iter().map(|s| s.rows).collect::<Vec<_>>();
        assert_eq!(rows(&a), rows(&b));
        assert_eq!(first.business_rows(), second.business_rows());
    }
}
