//! [`Backend`] implementation for Snowflake hybrid tables.

use crate::api::{Binding, SqlApiSession, StatementResult};
use crate::config::{SnowflakeConnection, SnowflakeSettings};
use crate::error::{SnowflakeError, BACKEND_NAME};
use crate::sql;
use async_trait::async_trait;
use bench_core::{
    Backend, BackendKind, BenchError, BusinessRecord, FireAndForget, QueryParams, ResultMode,
    SchemaSpec, SyntheticRecord, Watermark, WatermarkLayout, WatermarkUniverse,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Rows per bound multi-row insert when seeding.
const BIND_CHUNK_ROWS: usize = 500;

/// Where the session's connection parameters come from.
enum ConnectionSource {
    Settings(SnowflakeSettings),
    Resolved(SnowflakeConnection),
}

/// Lifecycle of the shared session.
enum SessionSlot {
    Idle,
    Open(Arc<SqlApiSession>),
    Closed,
}

/// Snowflake backend sharing one lazily created SQL API session.
pub struct SnowflakeBackend {
    source: ConnectionSource,
    session: Mutex<SessionSlot>,
}

impl SnowflakeBackend {
    /// Backend that reads `connections.toml` on first use.
    pub fn new(settings: SnowflakeSettings) -> Self {
        Self {
            source: ConnectionSource::Settings(settings),
            session: Mutex::new(SessionSlot::Idle),
        }
    }

    pub fn from_connection(conn: SnowflakeConnection) -> Self {
        Self {
            source: ConnectionSource::Resolved(conn),
            session: Mutex::new(SessionSlot::Idle),
        }
    }

    /// The shared session, created and validated on first use.
    ///
    /// Concurrent first callers wait on the slot lock, so only one session
    /// is ever opened. A failed open leaves the slot idle for the next caller.
    async fn session(&self) -> Result<Arc<SqlApiSession>, SnowflakeError> {
        let mut slot = self.session.lock().await;
        match &*slot {
            SessionSlot::Open(session) => return Ok(Arc::clone(session)),
            SessionSlot::Closed => return Err(SnowflakeError::Closed),
            SessionSlot::Idle => {}
        }

        let conn = match &self.source {
            ConnectionSource::Settings(settings) => settings.resolve()?,
            ConnectionSource::Resolved(conn) => conn.clone(),
        };
        info!(
            "Connecting to Snowflake account '{}' (database {}, schema {})",
            conn.account, conn.database, conn.schema
        );
        let session = Arc::new(SqlApiSession::new(conn)?);
        session.execute("SELECT 1", Vec::new()).await?;
        *slot = SessionSlot::Open(Arc::clone(&session));
        Ok(session)
    }

    async fn execute(
        &self,
        statement: &str,
        bindings: Vec<Binding>,
    ) -> Result<StatementResult, SnowflakeError> {
        self.session().await?.execute(statement, bindings).await
    }

    async fn bulk_insert(
        &self,
        table: &str,
        columns: &[&str],
        conversions: &[&str],
        row_count: usize,
        bindings: Vec<Binding>,
    ) -> Result<u64, SnowflakeError> {
        let statement = sql::bulk_insert(table, columns, conversions, row_count);
        let result = self.execute(&statement, bindings).await?;
        Ok(result.rows_inserted.unwrap_or(row_count as u64))
    }
}

fn parse_count(result: &StatementResult) -> Result<u64, SnowflakeError> {
    let value = result
        .scalar()
        .ok_or_else(|| SnowflakeError::UnexpectedResponse("empty COUNT(*) result".to_string()))?;
    value
        .parse::<u64>()
        .map_err(|e| SnowflakeError::UnexpectedResponse(format!("COUNT(*) returned '{value}': {e}")))
}

#[async_trait]
impl Backend for SnowflakeBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Analytical
    }

    async fn setup_schema(&self, spec: SchemaSpec) -> Result<(), BenchError> {
        let statements: Vec<&str> = match spec {
            SchemaSpec::Transactions => vec![sql::CREATE_TRANSACTIONS],
            SchemaSpec::Join(layout) => sql::join_schema_statements(layout).to_vec(),
        };
        for statement in statements {
            debug!("DDL: {}", statement.trim());
            self.execute(statement, Vec::new())
                .await
                .map_err(|e| e.into_setup())?;
        }

        match spec {
            SchemaSpec::Transactions => {
                info!("Created hybrid table '{}'", sql::TRANSACTIONS_TABLE)
            }
            SchemaSpec::Join(_) => info!(
                "Created table '{}' and hybrid table '{}'",
                sql::BUSINESS_TABLE,
                sql::WATERMARKS_TABLE
            ),
        }
        Ok(())
    }

    async fn insert_one(&self, record: &SyntheticRecord) -> Result<Duration, BenchError> {
        let session = self.session().await.map_err(|e| e.into_operation())?;
        let bindings = sql::transaction_bindings(record);

        let start = Instant::now();
        session
            .execute(sql::INSERT_TRANSACTION, bindings)
            .await
            .map_err(|e| e.into_operation())?;
        Ok(start.elapsed())
    }

    async fn insert_business_batch(&self, rows: &[BusinessRecord]) -> Result<u64, BenchError> {
        let mut inserted = 0;
        for chunk in rows.chunks(BIND_CHUNK_ROWS) {
            inserted += self
                .bulk_insert(
                    sql::BUSINESS_TABLE,
                    &sql::BUSINESS_COLUMNS,
                    &sql::BUSINESS_CONVERSIONS,
                    chunk.len(),
                    sql::business_bindings(chunk),
                )
                .await
                .map_err(|e| e.into_operation())?;
        }
        Ok(inserted)
    }

    async fn insert_watermarks(&self, watermarks: &[Watermark]) -> Result<u64, BenchError> {
        let Some(first) = watermarks.first() else {
            return Ok(0);
        };
        let layout = if first.pipeline_id.is_some() {
            WatermarkLayout::MultiPipeline
        } else {
            WatermarkLayout::Single
        };

        let mut inserted = 0;
        for chunk in watermarks.chunks(BIND_CHUNK_ROWS) {
            let bindings = sql::watermark_bindings(layout, chunk).ok_or_else(|| {
                BenchError::operation(
                    BACKEND_NAME,
                    "watermarks mix rows with and without a pipeline id",
                )
            })?;
            inserted += self
                .bulk_insert(
                    sql::WATERMARKS_TABLE,
                    sql::watermark_columns(layout),
                    sql::watermark_conversions(layout),
                    chunk.len(),
                    bindings,
                )
                .await
                .map_err(|e| e.into_operation())?;
        }
        Ok(inserted)
    }

    async fn watermark_universe(
        &self,
        layout: WatermarkLayout,
    ) -> Result<WatermarkUniverse, BenchError> {
        let partitions = self
            .execute(sql::DISTINCT_PARTITIONS, Vec::new())
            .await
            .map_err(|e| e.into_operation())?
            .first_column();
        let pipelines = match layout {
            WatermarkLayout::Single => Vec::new(),
            WatermarkLayout::MultiPipeline => self
                .execute(sql::DISTINCT_PIPELINES, Vec::new())
                .await
                .map_err(|e| e.into_operation())?
                .first_column(),
        };
        Ok(WatermarkUniverse {
            partitions,
            pipelines,
        })
    }

    async fn run_query(&self, params: &QueryParams) -> Result<(u64, Duration), BenchError> {
        let session = self.session().await.map_err(|e| e.into_operation())?;
        let layout = match params.pipeline_id {
            Some(_) => WatermarkLayout::MultiPipeline,
            None => WatermarkLayout::Single,
        };
        let mut bindings = vec![Binding::text(params.partition_key.clone())];
        if let Some(pipeline) = &params.pipeline_id {
            bindings.push(Binding::text(pipeline.clone()));
        }

        let start = Instant::now();
        let result = session
            .execute(sql::join_query(layout, params.mode), bindings)
            .await
            .map_err(|e| e.into_operation())?;
        let elapsed = start.elapsed();

        let result_size = match params.mode {
            ResultMode::Fetch => result.rows.len() as u64,
            ResultMode::Count => parse_count(&result).map_err(|e| e.into_operation())?,
        };
        Ok((result_size, elapsed))
    }

    async fn count_rows(&self) -> Result<u64, BenchError> {
        let result = self
            .execute(sql::COUNT_TRANSACTIONS, Vec::new())
            .await
            .map_err(|e| e.into_operation())?;
        parse_count(&result).map_err(|e| e.into_operation())
    }

    async fn close(&self) -> Result<(), BenchError> {
        let previous = std::mem::replace(&mut *self.session.lock().await, SessionSlot::Closed);
        match previous {
            SessionSlot::Closed => return Ok(()),
            // in-flight operations keep their own handle until they finish
            SessionSlot::Open(session) => drop(session),
            SessionSlot::Idle => {}
        }
        info!("Closed Snowflake backend");
        Ok(())
    }

    fn fire_and_forget(&self) -> Option<&dyn FireAndForget> {
        Some(self)
    }
}

#[async_trait]
impl FireAndForget for SnowflakeBackend {
    async fn dispatch_insert(&self, record: &SyntheticRecord) -> Result<(), BenchError> {
        let session = self.session().await.map_err(|e| e.into_operation())?;
        let handle = session
            .submit_async(sql::INSERT_TRANSACTION, sql::transaction_bindings(record))
            .await
            .map_err(|e| e.into_operation())?;
        debug!("Dispatched insert {} as statement {}", record.id, handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_generator::RecordGenerator;

    fn connection() -> SnowflakeConnection {
        SnowflakeConnection {
            account: "acct".to_string(),
            user: None,
            base_url: "http://127.0.0.1:9".to_string(),
            token: "t".to_string(),
            token_type: "OAUTH".to_string(),
            warehouse: None,
            database: "DB".to_string(),
            schema: "PUBLIC".to_string(),
            role: None,
        }
    }

    #[test]
    fn test_parse_count() {
        let result = StatementResult {
            rows: vec![vec![Some("42".to_string())]],
            num_rows: 1,
            ..Default::default()
        };
        assert_eq!(parse_count(&result).unwrap(), 42);
        assert!(parse_count(&StatementResult::default()).is_err());
    }

    #[test]
    fn test_offers_fire_and_forget() {
        let backend = SnowflakeBackend::from_connection(connection());
        assert!(backend.fire_and_forget().is_some());
        assert_eq!(backend.kind(), BackendKind::Analytical);
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_use() {
        let backend = SnowflakeBackend::from_connection(connection());
        backend.close().await.unwrap();
        backend.close().await.unwrap();

        let record = RecordGenerator::new(Some(1)).record_at(0);
        assert!(matches!(
            backend.insert_one(&record).await,
            Err(BenchError::Closed(_))
        ));
        assert!(matches!(
            backend.count_rows().await,
            Err(BenchError::Closed(_))
        ));
    }

    #[tokio::test]
    async fn test_close_releases_open_session() {
        let backend = SnowflakeBackend::from_connection(connection());
        let session = Arc::new(SqlApiSession::new(connection()).unwrap());
        let weak = Arc::downgrade(&session);
        *backend.session.lock().await = SessionSlot::Open(session);

        assert!(backend.session().await.is_ok());
        backend.close().await.unwrap();

        assert!(weak.upgrade().is_none());
        assert!(matches!(
            *backend.session.lock().await,
            SessionSlot::Closed
        ));
        assert!(matches!(
            backend.session().await,
            Err(SnowflakeError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_failed_open_leaves_session_idle() {
        let backend = SnowflakeBackend::from_connection(connection());
        assert!(backend.session().await.is_err());
        assert!(matches!(*backend.session.lock().await, SessionSlot::Idle));
    }

    #[tokio::test]
    async fn test_unreachable_account_is_setup_error() {
        let backend = SnowflakeBackend::from_connection(connection());
        let result = backend.setup_schema(SchemaSpec::Transactions).await;
        assert!(matches!(result, Err(BenchError::Setup { .. })));
    }
}
