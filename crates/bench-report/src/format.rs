//! Console rendering of results and comparisons.

use crate::compare::{Comparison, ComparisonMetric};
use crate::result::{InsertBenchmarkResult, InsertMode, QueryBenchmarkResult};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

/// Text block for one insert run.
pub fn format_insert_result(result: &InsertBenchmarkResult) -> String {
    let mut output = format!("\n--- {} Benchmark Results ---\n", result.database);
    output.push_str(&format!("Mode: {}\n", result.mode.label()));
    output.push_str(&format!(
        "Total records: {}/{}\n",
        format_number(result.actual_records_inserted),
        format_number(result.total_records)
    ));
    output.push_str(&format!(
        "Total time: {:.2} seconds\n",
        result.total_time_seconds
    ));
    output.push_str(&format!(
        "Insert time: {:.2} seconds\n",
        result.insert_time_seconds
    ));
    output.push_str(&format!(
        "Target insert rate: {} records/second\n",
        result.target_inserts_per_second
    ));
    output.push_str(&format!(
        "Actual average rate: {:.2} records/second\n",
        result.average_inserts_per_second
    ));
    if result.mode == InsertMode::FireAndForget {
        output.push_str(
            "Note: rate measured from first to last dispatch; \
             writes were not confirmed and may still be running\n",
        );
    }
    output
}

/// Text block for one query run.
pub fn format_query_result(result: &QueryBenchmarkResult) -> String {
    let mut output = format!("\n--- {} Join Benchmark Results ---\n", result.database);
    output.push_str(&format!(
        "Iterations: {} (result mode: {})\n",
        result.iterations, result.result_mode
    ));
    output.push_str(&format!(
        "Average query time: {:.6} seconds\n",
        result.avg_query_time_seconds
    ));
    output.push_str(&format!(
        "Min/max query time: {:.6}/{:.6} seconds\n",
        result.min_query_time, result.max_query_time
    ));
    output.push_str(&format!(
        "Average records retrieved: {:.1}\n",
        result.avg_records_retrieved
    ));
    output.push_str(&format!(
        "Total query time: {:.4} seconds\n",
        result.total_time_seconds
    ));
    output.push_str(&format!(
        "Total benchmark time: {}\n",
        format_duration(result.total_benchmark_time_seconds)
    ));
    output
}

/// Comparison block listing every backend against the reference.
pub fn format_comparison(comparison: &Comparison) -> String {
    let mut output = String::from("\n--- Performance Comparison ---\n");
    for entry in &comparison.entries {
        let value = match comparison.metric {
            ComparisonMetric::InsertRate => format!("{:.2} records/second", entry.value),
            ComparisonMetric::QueryLatency => format!("{:.6} seconds average", entry.value),
        };
        let standing = if entry.is_reference {
            "(Fastest)".to_string()
        } else {
            match entry.slowdown_pct {
                Some(pct) => format!("({pct:.1}% slower than {})", comparison.reference),
                None => "(no comparable measurement)".to_string(),
            }
        };
        output.push_str(&format!("{}: {} {}\n", entry.database, value, standing));
    }
    output
}

/// Average latencies of two query runs plus a one-line speedup verdict.
pub fn format_speedup(comparison: &Comparison) -> String {
    let mut output = String::from("\n=== Benchmark Comparison ===\n");
    for entry in &comparison.entries {
        output.push_str(&format!(
            "{} avg query time: {:.6} seconds\n",
            entry.database, entry.value
        ));
    }

    let slowest = comparison
        .entries
        .iter()
        .filter(|e| !e.is_reference)
        .filter_map(|e| e.speedup.map(|s| (e, s)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    match slowest {
        Some((entry, speedup)) => output.push_str(&format!(
            "{} is {:.2}x faster than {}\n",
            comparison.reference, speedup, entry.database
        )),
        None => output.push_str("No comparable measurement\n"),
    }
    output
}

/// Summary table of insert runs.
pub fn format_insert_table(results: &[InsertBenchmarkResult]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Database", "Mode", "Rows", "Target/sec", "Actual/sec", "Duration",
    ]);

    for result in results {
        let rows_cell = if result.actual_records_inserted >= result.total_records {
            Cell::new(format_number(result.actual_records_inserted)).fg(Color::Green)
        } else {
            Cell::new(format!(
                "{}/{}",
                format_number(result.actual_records_inserted),
                format_number(result.total_records)
            ))
            .fg(Color::Yellow)
        };
        let mode_cell = match result.mode {
            InsertMode::Confirmed => Cell::new(result.mode),
            InsertMode::FireAndForget => Cell::new(format!("{}†", result.mode)),
        };

        table.add_row(vec![
            Cell::new(&result.database),
            mode_cell,
            rows_cell,
            Cell::new(result.target_inserts_per_second),
            Cell::new(format!("{:.1}", result.average_inserts_per_second)),
            Cell::new(format_duration(result.total_time_seconds)),
        ]);
    }

    let mut output = table.to_string();
    if results.iter().any(|r| r.mode == InsertMode::FireAndForget) {
        output.push_str("\n† Dispatch throughput ceiling, not confirmed writes\n");
    }
    output
}

/// Summary table of query runs.
pub fn format_query_table(results: &[&QueryBenchmarkResult]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Database", "Mode", "Iterations", "Avg (s)", "Min (s)", "Max (s)", "Avg rows",
    ]);

    for result in results {
        table.add_row(vec![
            Cell::new(&result.database),
            Cell::new(result.result_mode),
            Cell::new(result.iterations),
            Cell::new(format!("{:.6}", result.avg_query_time_seconds)),
            Cell::new(format!("{:.6}", result.min_query_time)),
            Cell::new(format!("{:.6}", result.max_query_time)),
            Cell::new(format!("{:.1}", result.avg_records_retrieved)),
        ]);
    }
    table.to_string()
}

/// Format duration in human-readable format.
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs - (mins * 60.0);
        format!("{}m {:02.0}s", mins as u64, remaining_secs)
    } else {
        let hours = (secs / 3600.0).floor();
        let remaining = secs - (hours * 3600.0);
        let mins = (remaining / 60.0).floor();
        format!("{}h {:02.0}m", hours as u64, mins as u64)
    }
}

/// Format number with thousands separators.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}
