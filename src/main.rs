//! Command-line interface for hybrid-bench
//!
//! # Usage Examples
//!
//! ## Insert Throughput
//! ```bash
//! # Both backends at 3000 inserts/second
//! hybrid-bench insert --inserts-per-second 3000 --total-records 10000
//!
//! # PostgreSQL only, reproducible records
//! hybrid-bench insert --postgres --postgres-port 5433 --seed 42
//!
//! # Snowflake with confirmed inserts instead of async submission
//! hybrid-bench insert --snowflake --snowflake-mode confirmed
//! ```
//!
//! ## Join/Watermark Latency
//! ```bash
//! # Both backends, multi-pipeline watermarks
//! hybrid-bench join --num-business-records 10000 --num-partitions 10 --num-pipelines 5
//!
//! # Count-only queries against Snowflake
//! hybrid-bench join --benchmark snowflake --result-mode count \
//!   --snowflake-connection hybrid_table_poc --snowflake-warehouse BENCH_WH
//! ```
//!
//! Set `RUST_LOG` to adjust log verbosity (default: `info`).

use clap::{Parser, Subcommand};
use hybrid_bench::bench::{run_insert, run_join, InsertArgs, JoinArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hybrid-bench")]
#[command(about = "Benchmark PostgreSQL against Snowflake hybrid tables")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure insert throughput with a rate-controlled concurrent loader
    Insert(InsertArgs),

    /// Measure watermark join query latency
    Join(JoinArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Insert(args) => run_insert(args).await,
        Commands::Join(args) => run_join(args).await,
    }
}
