//! `hybrid-bench insert`: insert throughput per backend.

use crate::{PostgresOpts, SnowflakeOpts};
use anyhow::Context;
use bench_core::Backend;
use bench_harness::{run_insert_benchmark, InsertRunConfig, LoaderConfig, DEFAULT_MAX_CONCURRENCY};
use bench_report::format::{format_comparison, format_insert_result, format_insert_table};
use bench_report::{compare_insert_results, write_report, InsertMode, InsertReport};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// How the Snowflake insert pass submits statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SnowflakeMode {
    /// Await every insert
    Confirmed,
    /// Submit asynchronously and only await acceptance
    FireAndForget,
}

impl From<SnowflakeMode> for InsertMode {
    fn from(mode: SnowflakeMode) -> Self {
        match mode {
            SnowflakeMode::Confirmed => InsertMode::Confirmed,
            SnowflakeMode::FireAndForget => InsertMode::FireAndForget,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct InsertArgs {
    /// Target insert rate (records per second)
    #[arg(long, default_value = "3000", value_parser = clap::value_parser!(u32).range(1..))]
    pub inserts_per_second: u32,

    /// Total number of records to insert
    #[arg(long, default_value = "10000")]
    pub total_records: u64,

    /// Output file for benchmark results
    #[arg(long, default_value = "benchmark_results.json")]
    pub output: PathBuf,

    /// Run the PostgreSQL benchmark
    #[arg(long)]
    pub postgres: bool,

    /// Run the Snowflake benchmark
    #[arg(long)]
    pub snowflake: bool,

    /// Upper limit on concurrent inserts
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Insert mode for Snowflake
    #[arg(long, value_enum, default_value = "fire-and-forget")]
    pub snowflake_mode: SnowflakeMode,

    /// Random seed for reproducible records (same seed = same data)
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub postgres_opts: PostgresOpts,

    #[command(flatten)]
    pub snowflake_opts: SnowflakeOpts,
}

impl InsertArgs {
    /// Backends to run as `(postgres, snowflake)`; both when neither flag is set.
    pub fn selected(&self) -> (bool, bool) {
        if !self.postgres && !self.snowflake {
            (true, true)
        } else {
            (self.postgres, self.snowflake)
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(self.inserts_per_second, self.total_records)
            .with_max_concurrency(self.max_concurrency)
    }

    pub fn run_config(&self, mode: InsertMode) -> InsertRunConfig {
        InsertRunConfig::new(self.loader_config())
            .with_mode(mode)
            .with_seed(self.seed)
    }
}

/// One backend and how to drive it.
pub struct InsertPlan {
    pub backend: Arc<dyn Backend>,
    pub config: InsertRunConfig,
}

pub async fn run_insert(args: InsertArgs) -> anyhow::Result<()> {
    let (postgres, snowflake) = args.selected();
    let mut plans = Vec::new();

    if postgres {
        let pool_size = args.loader_config().concurrency_bound();
        info!(
            "PostgreSQL target: {} (pool size {})",
            args.postgres_opts.display_target(),
            pool_size
        );
        plans.push(InsertPlan {
            backend: Arc::new(args.postgres_opts.backend(pool_size)?),
            config: args.run_config(InsertMode::Confirmed),
        });
    }

    if snowflake {
        info!(
            "Snowflake connection: {}",
            args.snowflake_opts.snowflake_connection
        );
        plans.push(InsertPlan {
            backend: Arc::new(args.snowflake_opts.backend()),
            config: args.run_config(args.snowflake_mode.into()),
        });
    }

    execute_insert(plans, &args.output).await?;
    Ok(())
}

/// Run every plan in order, print the summaries and write the report.
///
/// The report is written only after every backend finished.
pub async fn execute_insert(plans: Vec<InsertPlan>, output: &Path) -> anyhow::Result<InsertReport> {
    let mut results = Vec::with_capacity(plans.len());
    for plan in plans {
        let name = plan.backend.name().to_string();
        let result = run_insert_benchmark(plan.backend, &plan.config)
            .await
            .with_context(|| format!("{name} insert benchmark failed"))?;
        println!("{}", format_insert_result(&result));
        results.push(result);
    }

    if let Some(comparison) = compare_insert_results(&results) {
        println!("{}", format_comparison(&comparison));
        println!("{}", format_insert_table(&results));
    }

    let report = InsertReport::new(results);
    write_report(output, &report)?;
    println!("Results saved to {}", output.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: InsertArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["hybrid-bench"]);
        let args = cli.args;
        assert_eq!(args.inserts_per_second, 3000);
        assert_eq!(args.total_records, 10000);
        assert_eq!(args.output, PathBuf::from("benchmark_results.json"));
        assert_eq!(args.snowflake_mode, SnowflakeMode::FireAndForget);
        assert_eq!(args.selected(), (true, true));
        assert_eq!(args.loader_config().concurrency_bound(), 100);
    }

    #[test]
    fn test_single_backend_selection() {
        let cli = TestCli::parse_from(["hybrid-bench", "--snowflake"]);
        assert_eq!(cli.args.selected(), (false, true));
    }

    #[test]
    fn test_rate_must_be_positive() {
        let parsed = TestCli::try_parse_from(["hybrid-bench", "--inserts-per-second", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_run_config_carries_mode_and_seed() {
        let cli = TestCli::parse_from([
            "hybrid-bench",
            "--inserts-per-second",
            "40",
            "--seed",
            "7",
            "--snowflake-mode",
            "confirmed",
        ]);
        let config = cli.args.run_config(cli.args.snowflake_mode.into());
        assert_eq!(config.mode, InsertMode::Confirmed);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.loader.concurrency_bound(), 40);
    }
}
