//! `hybrid-bench join`: watermark join latency per backend.

use crate::{PostgresOpts, SnowflakeOpts};
use anyhow::Context;
use bench_core::{Backend, ResultMode};
use bench_harness::{run_join_benchmark, JoinConfig};
use bench_postgresql::DEFAULT_POOL_MAX_SIZE;
use bench_report::format::{format_query_result, format_query_table, format_speedup};
use bench_report::{compare_query_results, write_report, JoinReport, QueryBenchmarkResult};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BenchmarkTarget {
    Postgres,
    Snowflake,
    Both,
}

impl BenchmarkTarget {
    pub fn includes_postgres(self) -> bool {
        matches!(self, BenchmarkTarget::Postgres | BenchmarkTarget::Both)
    }

    pub fn includes_snowflake(self) -> bool {
        matches!(self, BenchmarkTarget::Snowflake | BenchmarkTarget::Both)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResultModeArg {
    /// Fetch every matching row
    Fetch,
    /// Retrieve only the row count
    Count,
}

impl From<ResultModeArg> for ResultMode {
    fn from(mode: ResultModeArg) -> Self {
        match mode {
            ResultModeArg::Fetch => ResultMode::Fetch,
            ResultModeArg::Count => ResultMode::Count,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct JoinArgs {
    /// Which backends to benchmark
    #[arg(long, value_enum, default_value = "both")]
    pub benchmark: BenchmarkTarget,

    /// Number of business records to seed
    #[arg(long, default_value = "10000")]
    pub num_business_records: u64,

    /// Number of partitions (companies)
    #[arg(long, default_value = "10")]
    pub num_partitions: u32,

    /// Number of pipelines per partition
    #[arg(long, default_value = "5")]
    pub num_pipelines: u32,

    /// Number of timed query iterations
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub num_iterations: u64,

    /// Output file for benchmark results
    #[arg(long, default_value = "hybrid_tables_benchmark_results.json")]
    pub output: PathBuf,

    /// Whether queries fetch all rows or only count them
    #[arg(long, value_enum, default_value = "fetch")]
    pub result_mode: ResultModeArg,

    /// Maximum PostgreSQL pool size
    #[arg(long, default_value_t = DEFAULT_POOL_MAX_SIZE)]
    pub postgres_pool_size: usize,

    /// Random seed for reproducible workloads (same seed = same data)
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub postgres_opts: PostgresOpts,

    #[command(flatten)]
    pub snowflake_opts: SnowflakeOpts,
}

impl JoinArgs {
    pub fn join_config(&self) -> JoinConfig {
        JoinConfig {
            num_business_records: self.num_business_records,
            num_partitions: self.num_partitions,
            num_pipelines: self.num_pipelines,
            num_iterations: self.num_iterations as usize,
            result_mode: self.result_mode.into(),
            seed: self.seed,
            window: None,
        }
    }
}

pub async fn run_join(args: JoinArgs) -> anyhow::Result<()> {
    let config = args.join_config();
    info!(
        "Join benchmark: {} business records, {} partitions, {} pipelines, {} iterations ({})",
        config.num_business_records,
        config.num_partitions,
        config.num_pipelines,
        config.num_iterations,
        config.result_mode
    );

    let snowflake = args
        .benchmark
        .includes_snowflake()
        .then(|| args.snowflake_opts.backend());
    let postgres = if args.benchmark.includes_postgres() {
        info!("PostgreSQL target: {}", args.postgres_opts.display_target());
        Some(args.postgres_opts.backend(args.postgres_pool_size)?)
    } else {
        None
    };

    execute_join(
        snowflake.as_ref().map(|b| b as &dyn Backend),
        postgres.as_ref().map(|b| b as &dyn Backend),
        &config,
        &args.output,
    )
    .await?;
    Ok(())
}

/// Run Snowflake then PostgreSQL, write the report and print the comparison.
pub async fn execute_join(
    snowflake: Option<&dyn Backend>,
    postgres: Option<&dyn Backend>,
    config: &JoinConfig,
    output: &Path,
) -> anyhow::Result<JoinReport> {
    let mut report = JoinReport::default();
    if let Some(backend) = snowflake {
        report.snowflake = Some(run_one(backend, config).await?);
    }
    if let Some(backend) = postgres {
        report.postgres = Some(run_one(backend, config).await?);
    }

    write_report(output, &report)?;
    println!("\nResults saved to {}", output.display());

    let results = report.results();
    if let Some(comparison) = compare_query_results(&results) {
        println!("{}", format_speedup(&comparison));
        println!("{}", format_query_table(&results));
    }
    Ok(report)
}

async fn run_one(backend: &dyn Backend, config: &JoinConfig) -> anyhow::Result<QueryBenchmarkResult> {
    println!("\n=== Running {} Benchmark ===\n", backend.name());
    let result = run_join_benchmark(backend, config)
        .await
        .with_context(|| format!("{} join benchmark failed", backend.name()))?;
    println!("{}", format_query_result(&result));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::WatermarkLayout;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: JoinArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["hybrid-bench"]);
        let config = cli.args.join_config();
        assert_eq!(cli.args.benchmark, BenchmarkTarget::Both);
        assert_eq!(config.num_business_records, 10000);
        assert_eq!(config.num_partitions, 10);
        assert_eq!(config.num_iterations, 10);
        assert_eq!(config.layout(), WatermarkLayout::MultiPipeline);
        assert_eq!(config.result_mode, ResultMode::Fetch);
        assert_eq!(cli.args.postgres_pool_size, 20);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let parsed = TestCli::try_parse_from(["hybrid-bench", "--num-iterations", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_target_selection() {
        assert!(BenchmarkTarget::Postgres.includes_postgres());
        assert!(!BenchmarkTarget::Postgres.includes_snowflake());
        assert!(BenchmarkTarget::Both.includes_snowflake());
    }

    #[test]
    fn test_single_pipeline_count_mode() {
        let cli = TestCli::parse_from([
            "hybrid-bench",
            "--num-pipelines",
            "1",
            "--result-mode",
            "count",
        ]);
        let config = cli.args.join_config();
        assert_eq!(config.layout(), WatermarkLayout::Single);
        assert_eq!(config.result_mode, ResultMode::Count);
    }
}
