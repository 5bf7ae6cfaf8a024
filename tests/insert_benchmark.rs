//! End-to-end insert benchmark runs against in-memory backends.

use bench_harness::testing::MemoryBackend;
use bench_harness::{InsertRunConfig, LoaderConfig};
use bench_report::{InsertMode, InsertReport};
use hybrid_bench::bench::{execute_insert, InsertPlan};
use std::sync::Arc;
use std::time::Duration;

fn plan(backend: Arc<MemoryBackend>, mode: InsertMode) -> InsertPlan {
    InsertPlan {
        backend,
        config: InsertRunConfig::new(LoaderConfig::new(2000, 200))
            .with_mode(mode)
            .with_seed(Some(42)),
    }
}

#[tokio::test]
async fn test_two_backends_write_one_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("benchmark_results.json");

    let relational = Arc::new(
        MemoryBackend::new("PostgreSQL").with_insert_latency(Duration::from_millis(1)),
    );
    let analytical = Arc::new(MemoryBackend::new("Snowflake Hybrid Tables").analytical());

    let report = execute_insert(
        vec![
            plan(relational.clone(), InsertMode::Confirmed),
            plan(analytical.clone(), InsertMode::FireAndForget),
        ],
        &output,
    )
    .await?;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].database, "PostgreSQL");
    assert_eq!(report.results[0].actual_records_inserted, 200);
    assert_eq!(report.results[1].mode, InsertMode::FireAndForget);
    assert_eq!(analytical.dispatches(), 200);
    assert!(relational.is_closed());
    assert!(analytical.is_closed());

    let written: InsertReport = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    assert_eq!(written.results, report.results);

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    let first = &json["results"][0];
    for field in [
        "database",
        "mode",
        "target_inserts_per_second",
        "total_records",
        "actual_records_inserted",
        "total_time_seconds",
        "insert_time_seconds",
        "average_inserts_per_second",
    ] {
        assert!(first.get(field).is_some(), "missing field {field}");
    }
    Ok(())
}

#[tokio::test]
async fn test_failed_backend_leaves_no_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("benchmark_results.json");

    let healthy = Arc::new(MemoryBackend::new("PostgreSQL"));
    let failing = Arc::new(MemoryBackend::new("Snowflake Hybrid Tables").fail_insert_at(3));

    let result = execute_insert(
        vec![
            plan(healthy.clone(), InsertMode::Confirmed),
            plan(failing.clone(), InsertMode::Confirmed),
        ],
        &output,
    )
    .await;

    let err = result.expect_err("insert failure must surface");
    assert!(format!("{err:#}").contains("Snowflake Hybrid Tables insert benchmark failed"));
    assert!(!output.exists());
    assert!(failing.is_closed());
    Ok(())
}

#[tokio::test]
async fn test_seeded_runs_insert_the_same_count() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    let mut counts = Vec::new();
    for name in ["first", "second"] {
        let backend = Arc::new(MemoryBackend::new(name));
        let output = dir.path().join(format!("{name}.json"));
        let report = execute_insert(vec![plan(backend, InsertMode::Confirmed)], &output).await?;
        counts.push(report.results[0].actual_records_inserted);
    }
    assert_eq!(counts, vec![200, 200]);
    Ok(())
}
