//! Minimal client for the Snowflake SQL API v2.
//!
//! `POST /api/v2/statements` runs one statement. A `200` carries the first
//! result partition, a `202` means the statement is still running and its
//! handle must be polled until it completes. Errors come back as `4xx`/`5xx`
//! with a Snowflake error code and message in the body.

use crate::config::SnowflakeConnection;
use crate::error::SnowflakeError;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

/// Server-side statement timeout in seconds.
pub const STATEMENT_TIMEOUT_SECS: u64 = 300;

const HTTP_TIMEOUT: Duration = Duration::from_secs(STATEMENT_TIMEOUT_SECS + 30);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A typed value bound to a `:N` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

impl Binding {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: "TEXT",
            value: value.into(),
        }
    }

    pub fn fixed(value: i64) -> Self {
        Self {
            kind: "FIXED",
            value: value.to_string(),
        }
    }
}

/// Number the bindings `"1"`, `"2"`, ... in order.
pub fn numbered_bindings(bindings: Vec<Binding>) -> BTreeMap<String, Binding> {
    bindings
        .into_iter()
        .enumerate()
        .map(|(i, b)| ((i + 1).to_string(), b))
        .collect()
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    database: &'a str,
    schema: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, Binding>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    code: Option<String>,
    message: Option<String>,
    statement_handle: Option<String>,
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
    stats: Option<DmlStats>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    num_rows: Option<u64>,
    #[serde(default)]
    partition_info: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DmlStats {
    num_rows_inserted: Option<u64>,
}

/// A completed statement with all of its rows materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementResult {
    pub handle: Option<String>,
    /// Every cell arrives as a string; SQL `NULL` is `None`.
    pub rows: Vec<Vec<Option<String>>>,
    /// Row count announced by the result metadata.
    pub num_rows: u64,
    /// Set for DML statements.
    pub rows_inserted: Option<u64>,
}

impl StatementResult {
    /// First column of the first row.
    pub fn scalar(&self) -> Option<&str> {
        self.rows.first()?.first()?.as_deref()
    }

    /// First column of every row, skipping `NULL`s.
    pub fn first_column(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.first().cloned().flatten())
            .collect()
    }
}

#[derive(Debug)]
enum Outcome {
    Complete(RawResponse),
    Running(String),
}

/// One authenticated SQL API session shared by every operation.
pub struct SqlApiSession {
    http: Client,
    conn: SnowflakeConnection,
}

impl SqlApiSession {
    pub fn new(conn: SnowflakeConnection) -> Result<Self, SnowflakeError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("hybrid-bench/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, conn })
    }

    pub fn connection(&self) -> &SnowflakeConnection {
        &self.conn
    }

    fn statements_url(&self) -> String {
        format!("{}/api/v2/statements", self.conn.base_url)
    }

    fn request_body<'a>(
        &'a self,
        statement: &'a str,
        bindings: Vec<Binding>,
    ) -> StatementRequest<'a> {
        StatementRequest {
            statement,
            timeout: STATEMENT_TIMEOUT_SECS,
            database: &self.conn.database,
            schema: &self.conn.schema,
            warehouse: self.conn.warehouse.as_deref(),
            role: self.conn.role.as_deref(),
            bindings: numbered_bindings(bindings),
        }
    }

    async fn post(
        &self,
        statement: &str,
        bindings: Vec<Binding>,
        asynchronous: bool,
    ) -> Result<Outcome, SnowflakeError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let mut query = vec![("requestId", request_id.as_str())];
        if asynchronous {
            query.push(("async", "true"));
        }
        trace!("Submitting statement: {}", statement);

        let response = self
            .http
            .post(self.statements_url())
            .query(&query)
            .bearer_auth(&self.conn.token)
            .header("X-Snowflake-Authorization-Token-Type", &self.conn.token_type)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&self.request_body(statement, bindings))
            .send()
            .await?;
        decode(response).await
    }

    async fn get(&self, handle: &str, partition: Option<usize>) -> Result<Outcome, SnowflakeError> {
        let mut request = self
            .http
            .get(format!("{}/{}", self.statements_url(), handle))
            .bearer_auth(&self.conn.token)
            .header("X-Snowflake-Authorization-Token-Type", &self.conn.token_type)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(partition) = partition {
            request = request.query(&[("partition", partition)]);
        }
        decode(request.send().await?).await
    }

    /// Run a statement to completion and materialize every result partition.
    pub async fn execute(
        &self,
        statement: &str,
        bindings: Vec<Binding>,
    ) -> Result<StatementResult, SnowflakeError> {
        let mut outcome = self.post(statement, bindings, false).await?;
        let first = loop {
            match outcome {
                Outcome::Complete(raw) => break raw,
                Outcome::Running(handle) => {
                    tokio::time::sleep(POLL_INTERVAL).await;
                    outcome = self.get(&handle, None).await?;
                }
            }
        };

        let partitions = first
            .result_set_meta_data
            .as_ref()
            .map_or(0, |meta| meta.partition_info.len());
        let mut result = into_result(first);

        if partitions > 1 {
            let handle = result.handle.clone().ok_or_else(|| {
                SnowflakeError::UnexpectedResponse(
                    "partitioned result without a statement handle".to_string(),
                )
            })?;
            for partition in 1..partitions {
                match self.get(&handle, Some(partition)).await? {
                    Outcome::Complete(raw) => result.rows.extend(raw.data),
                    Outcome::Running(_) => {
                        return Err(SnowflakeError::UnexpectedResponse(format!(
                            "partition {partition} of a completed statement is still running"
                        )))
                    }
                }
            }
        }
        Ok(result)
    }

    /// Submit a statement without waiting for it to run.
    ///
    /// Returns the statement handle once Snowflake has accepted it.
    pub async fn submit_async(
        &self,
        statement: &str,
        bindings: Vec<Binding>,
    ) -> Result<String, SnowflakeError> {
        match self.post(statement, bindings, true).await? {
            Outcome::Running(handle) => Ok(handle),
            Outcome::Complete(raw) => raw.statement_handle.ok_or_else(|| {
                SnowflakeError::UnexpectedResponse("accepted statement without a handle".to_string())
            }),
        }
    }
}

async fn decode(response: Response) -> Result<Outcome, SnowflakeError> {
    let status = response.status();
    let body = response.text().await?;
    decode_body(status, &body)
}

fn decode_body(status: StatusCode, body: &str) -> Result<Outcome, SnowflakeError> {
    match status {
        StatusCode::OK => serde_json::from_str(body)
            .map(Outcome::Complete)
            .map_err(|e| SnowflakeError::UnexpectedResponse(format!("{e}: {body}"))),
        StatusCode::ACCEPTED => {
            let raw: RawResponse = serde_json::from_str(body)
                .map_err(|e| SnowflakeError::UnexpectedResponse(format!("{e}: {body}")))?;
            let handle = raw.statement_handle.ok_or_else(|| {
                SnowflakeError::UnexpectedResponse(format!("202 without a statement handle: {body}"))
            })?;
            debug!("Statement {} still running", handle);
            Ok(Outcome::Running(handle))
        }
        _ => {
            let raw: RawResponse = serde_json::from_str(body).unwrap_or_default();
            Err(SnowflakeError::Api {
                status: status.as_u16(),
                code: raw.code.unwrap_or_else(|| "unknown".to_string()),
                message: raw.message.unwrap_or_else(|| body.to_string()),
            })
        }
    }
}

fn into_result(raw: RawResponse) -> StatementResult {
    let num_rows = raw
        .result_set_meta_data
        .as_ref()
        .and_then(|meta| meta.num_rows)
        .unwrap_or(raw.data.len() as u64);
    StatementResult {
        handle: raw.statement_handle,
        rows: raw.data,
        num_rows,
        rows_inserted: raw.stats.and_then(|s| s.num_rows_inserted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> SnowflakeConnection {
        SnowflakeConnection {
            account: "acct".to_string(),
            user: None,
            base_url: "https://acct.snowflakecomputing.com".to_string(),
            token: "t".to_string(),
            token_type: "OAUTH".to_string(),
            warehouse: Some("WH".to_string()),
            database: "DB".to_string(),
            schema: "PUBLIC".to_string(),
            role: None,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let session = SqlApiSession::new(connection()).unwrap();
        let body = session.request_body(
            "SELECT :1, :2",
            vec![Binding::text("partition_1"), Binding::fixed(7)],
        );
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["database"], "DB");
        assert_eq!(json["warehouse"], "WH");
        assert!(json.get("role").is_none());
        assert_eq!(json["bindings"]["1"]["type"], "TEXT");
        assert_eq!(json["bindings"]["1"]["value"], "partition_1");
        assert_eq!(json["bindings"]["2"]["type"], "FIXED");
        assert_eq!(json["bindings"]["2"]["value"], "7");
    }

    #[test]
    fn test_bindings_omitted_when_empty() {
        let session = SqlApiSession::new(connection()).unwrap();
        let json = serde_json::to_value(session.request_body("SELECT 1", Vec::new())).unwrap();
        assert!(json.get("bindings").is_none());
    }

    #[test]
    fn test_decode_completed_statement() {
        let body = r#"{
            "code": "090001",
            "statementHandle": "01b2-abc",
            "resultSetMetaData": {"numRows": 2, "partitionInfo": [{"rowCount": 2}]},
            "data": [["partition_1"], [null]]
        }"#;
        let Outcome::Complete(raw) = decode_body(StatusCode::OK, body).unwrap() else {
            panic!("expected a completed statement");
        };
        let result = into_result(raw);
        assert_eq!(result.num_rows, 2);
        assert_eq!(result.scalar(), Some("partition_1"));
        assert_eq!(result.first_column(), vec!["partition_1".to_string()]);
        assert_eq!(result.handle.as_deref(), Some("01b2-abc"));
    }

    #[test]
    fn test_decode_running_statement() {
        let body = r#"{"code": "333334", "statementHandle": "01b2-def",
                       "statementStatusUrl": "/api/v2/statements/01b2-def"}"#;
        match decode_body(StatusCode::ACCEPTED, body).unwrap() {
            Outcome::Running(handle) => assert_eq!(handle, "01b2-def"),
            Outcome::Complete(_) => panic!("expected a running statement"),
        }
    }

    #[test]
    fn test_running_outcome_is_debuggable() {
        let body = r#"{"code": "333334", "statementHandle": "01b2-ghi"}"#;
        let outcome = decode_body(StatusCode::ACCEPTED, body).unwrap();
        assert!(format!("{outcome:?}").contains("01b2-ghi"));
    }

    #[test]
    fn test_decode_statement_error() {
        let body = r#"{"code": "002003", "message": "Table 'X' does not exist"}"#;
        let err = decode_body(StatusCode::UNPROCESSABLE_ENTITY, body).unwrap_err();
        match err {
            SnowflakeError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 422);
                assert_eq!(code, "002003");
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_dml_stats() {
        let body = r#"{"statementHandle": "h", "data": [["1"]], "stats": {"numRowsInserted": 1}}"#;
        let Outcome::Complete(raw) = decode_body(StatusCode::OK, body).unwrap() else {
            panic!("expected a completed statement");
        };
        assert_eq!(into_result(raw).rows_inserted, Some(1));
    }
}
