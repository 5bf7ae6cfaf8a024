//! SQL text and bindings for the Snowflake adapter.
//!
//! Values are bound to `:N` placeholders. Snowflake does not evaluate
//! functions such as `PARSE_JSON` inside a `VALUES` list, so inserts select
//! from a `VALUES` clause and convert the columns there.

use crate::api::Binding;
use bench_core::{BusinessRecord, ResultMode, SyntheticRecord, Watermark, WatermarkLayout};

pub const TRANSACTIONS_TABLE: &str = "TRANSACTIONS";
pub const BUSINESS_TABLE: &str = "BUSINESS_DATA";
pub const WATERMARKS_TABLE: &str = "WATERMARKS";

pub const CREATE_TRANSACTIONS: &str = "
CREATE OR REPLACE HYBRID TABLE TRANSACTIONS (
    ID VARCHAR(36) PRIMARY KEY,
    USER_ID INTEGER NOT NULL,
    PRODUCT_ID INTEGER NOT NULL,
    TRANSACTION_DATE TIMESTAMP_NTZ NOT NULL,
    AMOUNT NUMBER(10, 2) NOT NULL,
    STATUS VARCHAR(50) NOT NULL,
    PAYMENT_METHOD VARCHAR(50) NOT NULL,
    CUSTOMER_NAME VARCHAR(100) NOT NULL,
    EMAIL VARCHAR(100) NOT NULL,
    SHIPPING_ADDRESS VARCHAR NOT NULL
)";

pub const CREATE_BUSINESS: &str = "
CREATE OR REPLACE TABLE BUSINESS_DATA (
    ID VARCHAR(36) NOT NULL,
    PARTITION_KEY VARCHAR NOT NULL,
    TRANSACTION_DATE TIMESTAMP_NTZ NOT NULL,
    AMOUNT NUMBER(10, 2) NOT NULL,
    STATUS VARCHAR(50) NOT NULL,
    PAYLOAD VARIANT
)";

pub const CREATE_WATERMARKS_SINGLE: &str = "
CREATE OR REPLACE HYBRID TABLE WATERMARKS (
    COMPANY_ID VARCHAR NOT NULL PRIMARY KEY,
    LAST_PROCESSED_DATE TIMESTAMP_NTZ NOT NULL,
    UPDATED_AT TIMESTAMP_NTZ NOT NULL
)";

pub const CREATE_WATERMARKS_MULTI: &str = "
CREATE OR REPLACE HYBRID TABLE WATERMARKS (
    COMPANY_ID VARCHAR NOT NULL,
    LAST_PROCESSED_DATE TIMESTAMP_NTZ NOT NULL,
    PIPELINE_ID VARCHAR NOT NULL,
    UPDATED_AT TIMESTAMP_NTZ NOT NULL,
    PRIMARY KEY (COMPANY_ID, PIPELINE_ID)
)";

pub const INSERT_TRANSACTION: &str = "INSERT INTO TRANSACTIONS (
    ID, USER_ID, PRODUCT_ID, TRANSACTION_DATE, AMOUNT,
    STATUS, PAYMENT_METHOD, CUSTOMER_NAME, EMAIL, SHIPPING_ADDRESS
)
SELECT column1, column2, column3, TO_TIMESTAMP_NTZ(column4), column5::NUMBER(10, 2),
       column6, column7, column8, column9, column10
FROM VALUES (:1, :2, :3, :4, :5, :6, :7, :8, :9, :10)";

pub const COUNT_TRANSACTIONS: &str = "SELECT COUNT(*) FROM TRANSACTIONS";

pub const DISTINCT_PARTITIONS: &str =
    "SELECT DISTINCT COMPANY_ID FROM WATERMARKS ORDER BY COMPANY_ID";
pub const DISTINCT_PIPELINES: &str =
    "SELECT DISTINCT PIPELINE_ID FROM WATERMARKS ORDER BY PIPELINE_ID";

const FETCH_SINGLE: &str = "SELECT b.*
FROM BUSINESS_DATA b
JOIN WATERMARKS w ON b.PARTITION_KEY = w.COMPANY_ID
WHERE b.PARTITION_KEY = :1
  AND b.TRANSACTION_DATE > w.LAST_PROCESSED_DATE
ORDER BY b.TRANSACTION_DATE";

const FETCH_MULTI: &str = "SELECT b.*
FROM BUSINESS_DATA b
JOIN WATERMARKS w ON b.PARTITION_KEY = w.COMPANY_ID
WHERE b.PARTITION_KEY = :1
  AND w.PIPELINE_ID = :2
  AND b.TRANSACTION_DATE > w.LAST_PROCESSED_DATE
ORDER BY b.TRANSACTION_DATE";

const COUNT_SINGLE: &str = "SELECT COUNT(*)
FROM BUSINESS_DATA b
JOIN WATERMARKS w ON b.PARTITION_KEY = w.COMPANY_ID
WHERE b.PARTITION_KEY = :1
  AND b.TRANSACTION_DATE > w.LAST_PROCESSED_DATE";

const COUNT_MULTI: &str = "SELECT COUNT(*)
FROM BUSINESS_DATA b
JOIN WATERMARKS w ON b.PARTITION_KEY = w.COMPANY_ID
WHERE b.PARTITION_KEY = :1
  AND w.PIPELINE_ID = :2
  AND b.TRANSACTION_DATE > w.LAST_PROCESSED_DATE";

/// Statements that recreate the join benchmark tables.
pub fn join_schema_statements(layout: WatermarkLayout) -> [&'static str; 2] {
    let watermarks = match layout {
        WatermarkLayout::Single => CREATE_WATERMARKS_SINGLE,
        WatermarkLayout::MultiPipeline => CREATE_WATERMARKS_MULTI,
    };
    [CREATE_BUSINESS, watermarks]
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

/// `INSERT ... SELECT <conversions> FROM VALUES (:1, ...), (...)`.
///
/// `conversions` holds one expression per column written in terms of
/// `columnN`, e.g. `PARSE_JSON(column6)`.
pub fn bulk_insert(table: &str, columns: &[&str], conversions: &[&str], row_count: usize) -> String {
    let col_count = columns.len();
    let mut rows: Vec<String> = Vec::with_capacity(row_count);
    let mut param_idx = 1;

    for _ in 0..row_count {
        let placeholders: Vec<String> = (0..col_count)
            .map(|_| {
                let p = format!(":{param_idx}");
                param_idx += 1;
                p
            })
            .collect();
        rows.push(format!("({})", placeholders.join(", ")));
    }

    format!(
        "INSERT INTO {} ({}) SELECT {} FROM VALUES {}",
        table,
        columns.join(", "),
        conversions.join(", "),
        rows.join(", ")
    )
}

pub const BUSINESS_COLUMNS: [&str; 6] = [
    "ID",
    "PARTITION_KEY",
    "TRANSACTION_DATE",
    "AMOUNT",
    "STATUS",
    "PAYLOAD",
];

pub const BUSINESS_CONVERSIONS: [&str; 6] = [
    "column1",
    "column2",
    "TO_TIMESTAMP_NTZ(column3)",
    "column4::NUMBER(10, 2)",
    "column5",
    "PARSE_JSON(column6)",
];

pub fn watermark_columns(layout: WatermarkLayout) -> &'static [&'static str] {
    match layout {
        WatermarkLayout::Single => &["COMPANY_ID", "LAST_PROCESSED_DATE", "UPDATED_AT"],
        WatermarkLayout::MultiPipeline => &[
            "COMPANY_ID",
            "LAST_PROCESSED_DATE",
            "PIPELINE_ID",
            "UPDATED_AT",
        ],
    }
}

pub fn watermark_conversions(layout: WatermarkLayout) -> &'static [&'static str] {
    match layout {
        WatermarkLayout::Single => &[
            "column1",
            "TO_TIMESTAMP_NTZ(column2)",
            "TO_TIMESTAMP_NTZ(column3)",
        ],
        WatermarkLayout::MultiPipeline => &[
            "column1",
            "TO_TIMESTAMP_NTZ(column2)",
            "column3",
            "TO_TIMESTAMP_NTZ(column4)",
        ],
    }
}

/// Bindings for [`INSERT_TRANSACTION`].
pub fn transaction_bindings(record: &SyntheticRecord) -> Vec<Binding> {
    vec![
        Binding::text(record.id.to_string()),
        Binding::fixed(i64::from(record.user_id)),
        Binding::fixed(i64::from(record.product_id)),
        Binding::text(record.transaction_date.to_string()),
        Binding::text(record.amount.to_string()),
        Binding::text(record.status.as_str()),
        Binding::text(record.payment_method.as_str()),
        Binding::text(record.customer_name.clone()),
        Binding::text(record.email.clone()),
        Binding::text(record.shipping_address.clone()),
    ]
}

pub fn business_bindings(rows: &[BusinessRecord]) -> Vec<Binding> {
    let mut bindings = Vec::with_capacity(rows.len() * BUSINESS_COLUMNS.len());
    for row in rows {
        bindings.push(Binding::text(row.id.to_string()));
        bindings.push(Binding::text(row.partition_key.clone()));
        bindings.push(Binding::text(row.transaction_date.to_string()));
        bindings.push(Binding::text(row.amount.to_string()));
        bindings.push(Binding::text(row.status.as_str()));
        bindings.push(Binding::text(row.payload.to_string()));
    }
    bindings
}

/// Bindings for a watermark chunk, or `None` if rows disagree with `layout`.
pub fn watermark_bindings(layout: WatermarkLayout, rows: &[Watermark]) -> Option<Vec<Binding>> {
    let mut bindings = Vec::with_capacity(rows.len() * watermark_columns(layout).len());
    for wm in rows {
        bindings.push(Binding::text(wm.partition_key.clone()));
        bindings.push(Binding::text(wm.last_processed_date.to_string()));
        match (layout, &wm.pipeline_id) {
            (WatermarkLayout::MultiPipeline, Some(pipeline)) => {
                bindings.push(Binding::text(pipeline.clone()))
            }
            (WatermarkLayout::Single, None) => {}
            _ => return None,
        }
        bindings.push(Binding::text(wm.updated_at.to_string()));
    }
    Some(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_generator::RecordGenerator;
    use chrono::NaiveDate;

    #[test]
    fn test_bulk_insert_selects_from_values() {
        let sql = bulk_insert(
            "WATERMARKS",
            &["A", "B"],
            &["column1", "PARSE_JSON(column2)"],
            2,
        );
        assert_eq!(
            sql,
            "INSERT INTO WATERMARKS (A, B) SELECT column1, PARSE_JSON(column2) FROM VALUES (:1, :2), (:3, :4)"
        );
    }

    #[test]
    fn test_transaction_bindings_match_placeholders() {
        let record = RecordGenerator::new(Some(5)).record_at(0);
        let bindings = transaction_bindings(&record);
        assert_eq!(bindings.len(), 10);
        assert!(INSERT_TRANSACTION.contains(":10"));
        assert!(!INSERT_TRANSACTION.contains(":11"));
        assert_eq!(bindings[1].kind, "FIXED");
        assert_eq!(bindings[0].value, record.id.to_string());
    }

    #[test]
    fn test_watermark_bindings_reject_mixed_layout() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let single = Watermark::new("partition_1", None, ts, ts).unwrap();
        let multi = Watermark::new("partition_1", Some("pipeline_1".into()), ts, ts).unwrap();

        assert_eq!(
            watermark_bindings(WatermarkLayout::Single, &[single.clone()])
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            watermark_bindings(WatermarkLayout::MultiPipeline, &[multi.clone()])
                .unwrap()
                .len(),
            4
        );
        assert!(watermark_bindings(WatermarkLayout::Single, &[single, multi]).is_none());
    }

    #[test]
    fn test_conversions_match_columns() {
        assert_eq!(BUSINESS_COLUMNS.len(), BUSINESS_CONVERSIONS.len());
        for layout in [WatermarkLayout::Single, WatermarkLayout::MultiPipeline] {
            assert_eq!(
                watermark_columns(layout).len(),
                watermark_conversions(layout).len()
            );
        }
    }

    #[test]
    fn test_join_query_placeholders() {
        let multi = join_query(WatermarkLayout::MultiPipeline, ResultMode::Count);
        assert!(multi.contains("w.PIPELINE_ID = :2"));
        let single = join_query(WatermarkLayout::Single, ResultMode::Fetch);
        assert!(!single.contains(":2"));
        assert!(single.contains("ORDER BY b.TRANSACTION_DATE"));
    }
}
