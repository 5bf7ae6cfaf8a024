//! SQL text for the PostgreSQL adapter.
//!
//! Every value travels as a `$N` parameter; statements never embed data.

use bench_core::{ResultMode, WatermarkLayout};

pub const TRANSACTIONS_TABLE: &str = "transactions";
pub const BUSINESS_TABLE: &str = "business_data";
pub const WATERMARKS_TABLE: &str = "watermarks";

pub const CREATE_TRANSACTIONS: &str = "
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    user_id INTEGER NOT NULL,
    product_id INTEGER NOT NULL,
    transaction_date TIMESTAMP NOT NULL,
    amount DECIMAL(10, 2) NOT NULL,
    status VARCHAR(50) NOT NULL,
    payment_method VARCHAR(50) NOT NULL,
    customer_name VARCHAR(100) NOT NULL,
    email VARCHAR(100) NOT NULL,
    shipping_address TEXT NOT NULL,
    metadata JSONB NOT NULL
)";

pub const CREATE_BUSINESS: &str = "
CREATE TABLE business_data (
    id UUID PRIMARY KEY,
    partition_key TEXT NOT NULL,
    transaction_date TIMESTAMP NOT NULL,
    amount DECIMAL(10, 2) NOT NULL,
    status VARCHAR(50) NOT NULL,
    payload JSONB NOT NULL
)";

pub const CREATE_WATERMARKS_SINGLE: &str = "
CREATE TABLE watermarks (
    partition_key TEXT NOT NULL PRIMARY KEY,
    last_processed_date TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
)";

pub const CREATE_WATERMARKS_MULTI: &str = "
CREATE TABLE watermarks (
    partition_key TEXT NOT NULL,
    last_processed_date TIMESTAMP NOT NULL,
    pipeline_id TEXT NOT NULL,
    updated_at TIMESTAMP NOT NULL,
    PRIMARY KEY (partition_key, pipeline_id)
)";

pub const INSERT_TRANSACTION: &str = "INSERT INTO transactions (
    id, user_id, product_id, transaction_date, amount,
    status, payment_method, customer_name, email,
    shipping_address, metadata
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

pub const COUNT_TRANSACTIONS: &str = "SELECT COUNT(*) FROM transactions";

pub const DISTINCT_PARTITIONS: &str =
    "SELECT DISTINCT partition_key FROM watermarks ORDER BY partition_key";
pub const DISTINCT_PIPELINES: &str =
    "SELECT DISTINCT pipeline_id FROM watermarks ORDER BY pipeline_id";

const FETCH_SINGLE: &str = "SELECT b.*
FROM business_data b
JOIN watermarks w ON b.partition_key = w.partition_key
WHERE b.partition_key = $1
  AND b.transaction_date > w.last_processed_date
ORDER BY b.transaction_date";

const FETCH_MULTI: &str = "SELECT b.*
FROM business_data b
JOIN watermarks w ON b.partition_key = w.partition_key
WHERE b.partition_key = $1
  AND w.pipeline_id = $2
  AND b.transaction_date > w.last_processed_date
ORDER BY b.transaction_date";

const COUNT_SINGLE: &str = "SELECT COUNT(*)
FROM business_data b
JOIN watermarks w ON b.partition_key = w.partition_key
WHERE b.partition_key = $1
  AND b.transaction_date > w.last_processed_date";

const COUNT_MULTI: &str = "SELECT COUNT(*)
FROM business_data b
JOIN watermarks w ON b.partition_key = w.partition_key
WHERE b.partition_key = $1
  AND w.pipeline_id = $2
  AND b.transaction_date > w.last_processed_date";

/// Columns of a business row insert, in parameter order.
pub const BUSINESS_COLUMNS: [&str; 6] = [
    "id",
    "partition_key",
    "transaction_date",
    "amount",
    "status",
    "payload",
];

/// Watermark columns, in parameter order.
pub fn watermark_columns(layout: WatermarkLayout) -> &'static [&'static str] {
    match layout {
        WatermarkLayout::Single => &["partition_key", "last_processed_date", "updated_at"],
        WatermarkLayout::MultiPipeline => &[
            "partition_key",
            "last_processed_date",
            "pipeline_id",
            "updated_at",
        ],
    }
}

/// Statements that drop and recreate the join benchmark tables.
pub fn join_schema_statements(layout: WatermarkLayout) -> [&'static str; 4] {
    let watermarks = match layout {
        WatermarkLayout::Single => CREATE_WATERMARKS_SINGLE,
        WatermarkLayout::MultiPipeline => CREATE_WATERMARKS_MULTI,
    };
    [
        "DROP TABLE IF EXISTS business_data",
        "DROP TABLE IF EXISTS watermarks",
        CREATE_BUSINESS,
        watermarks,
    ]
}

/// The timed join query for a layout and result mode.
pub fn join_query(layout: WatermarkLayout, mode: ResultMode) -> &'static str {
    match (layout, mode) {
        (WatermarkLayout::Single, ResultMode::Fetch) => FETCH_SINGLE,
        (WatermarkLayout::MultiPipeline, ResultMode::Fetch) => FETCH_MULTI,
        (WatermarkLayout::Single, ResultMode::Count) => COUNT_SINGLE,
        (WatermarkLayout::MultiPipeline, ResultMode::Count) => COUNT_MULTI,
    }
}

/// Build a multi-row INSERT with numbered placeholders:
/// `INSERT INTO t (a, b) VALUES ($1, $2), ($3, $4)`.
pub fn bulk_insert(table: &str, columns: &[&str], row_count: usize) -> String {
    let col_count = columns.len();
    let mut placeholders: Vec<String> = Vec::with_capacity(row_count);
    let mut param_idx = 1;

    for _ in 0..row_count {
        let row_placeholders: Vec<String> = (0..col_count)
            .map(|_| {
                let p = format!("${param_idx}");
                param_idx += 1;
                p
            })
            .collect();
        placeholders.push(format!("({})", row_placeholders.join(", ")));
    }

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_insert_placeholders() {
        let sql = bulk_insert("watermarks", &["a", "b", "c"], 2);
        assert_eq!(
            sql,
            "INSERT INTO watermarks (a, b, c) VALUES ($1, $2, $3), ($4, $5, $6)"
        );
    }

    #[test]
    fn test_join_query_parameters() {
        let multi = join_query(WatermarkLayout::MultiPipeline, ResultMode::Fetch);
        assert!(multi.contains("w.pipeline_id = $2"));
        assert!(multi.contains("b.transaction_date > w.last_processed_date"));

        let single = join_query(WatermarkLayout::Single, ResultMode::Count);
        assert!(single.starts_with("SELECT COUNT(*)"));
        assert!(!single.contains("$2"));
    }

    #[test]
    fn test_watermark_columns_match_schema() {
        for layout in [WatermarkLayout::Single, WatermarkLayout::MultiPipeline] {
            let ddl = join_schema_statements(layout)[3];
            for column in watermark_columns(layout) {
                assert!(ddl.contains(column), "{column} missing from {ddl}");
            }
        }
    }
}
