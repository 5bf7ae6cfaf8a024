//! End-to-end join benchmark runs against in-memory backends.

use bench_core::{Backend, ResultMode};
use bench_harness::testing::MemoryBackend;
use bench_harness::JoinConfig;
use hybrid_bench::bench::execute_join;
use std::time::Duration;

fn config() -> JoinConfig {
    JoinConfig {
        num_business_records: 500,
        num_partitions: 5,
        num_pipelines: 2,
        num_iterations: 6,
        result_mode: ResultMode::Count,
        seed: Some(42),
        window: None,
    }
}

#[tokio::test]
async fn test_both_backends_report_and_compare() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("hybrid_tables_benchmark_results.json");

    let snowflake = MemoryBackend::new("Snowflake Hybrid Tables")
        .analytical()
        .with_query_latency(Duration::from_millis(4));
    let postgres = MemoryBackend::new("PostgreSQL").with_query_latency(Duration::from_millis(1));

    let report = execute_join(
        Some(&snowflake as &dyn Backend),
        Some(&postgres as &dyn Backend),
        &config(),
        &output,
    )
    .await?;

    let snowflake_result = report.snowflake.as_ref().ok_or("snowflake result missing")?;
    let postgres_result = report.postgres.as_ref().ok_or("postgres result missing")?;
    assert_eq!(snowflake_result.iterations, 6);
    assert_eq!(postgres_result.iterations, 6);
    assert!(snowflake_result.avg_query_time_seconds > postgres_result.avg_query_time_seconds);
    assert_eq!(snowflake.queries(), 6);
    assert_eq!(postgres.watermarks().len(), 10);
    assert!(snowflake.is_closed());
    assert!(postgres.is_closed());

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    assert_eq!(json["postgres"]["iterations"], 6);
    assert_eq!(json["snowflake"]["result_mode"], "count");
    Ok(())
}

#[tokio::test]
async fn test_single_backend_omits_the_other() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("postgres_only.json");

    let postgres = MemoryBackend::new("PostgreSQL");
    let report = execute_join(None, Some(&postgres as &dyn Backend), &config(), &output).await?;
    assert!(report.snowflake.is_none());

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    assert!(json.get("snowflake").is_none());
    assert!(json.get("postgres").is_some());
    Ok(())
}

#[tokio::test]
async fn test_setup_failure_aborts_before_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("failed.json");

    let snowflake = MemoryBackend::new("Snowflake Hybrid Tables").fail_setup();
    let postgres = MemoryBackend::new("PostgreSQL");

    let result = execute_join(
        Some(&snowflake as &dyn Backend),
        Some(&postgres as &dyn Backend),
        &config(),
        &output,
    )
    .await;

    assert!(result.is_err());
    assert!(!output.exists());
    assert_eq!(postgres.queries(), 0);
    assert!(snowflake.is_closed());
    Ok(())
}
