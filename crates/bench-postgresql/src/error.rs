//! Error types for the PostgreSQL adapter.

use bench_core::BenchError;
use deadpool_postgres::{BuildError, PoolError};
use thiserror::Error;

pub(crate) const BACKEND_NAME: &str = "PostgreSQL";

/// Errors that can occur while benchmarking PostgreSQL.
#[derive(Error, Debug)]
pub enum PostgresAdapterError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// The pool could not hand out a connection.
    #[error("Connection pool error: {0}")]
    Pool(PoolError),

    /// The pool could not be built.
    #[error("Connection pool build error: {0}")]
    PoolBuild(#[from] BuildError),

    /// The pool was used after `close()`.
    #[error("Connection pool is closed")]
    PoolClosed,

    /// The adapter was used after `close()`.
    #[error("Backend is closed")]
    Closed,
}

impl From<PoolError> for PostgresAdapterError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Closed => PostgresAdapterError::PoolClosed,
            PoolError::Backend(e) => PostgresAdapterError::PostgreSQL(e),
            other => PostgresAdapterError::Pool(other),
        }
    }
}

impl PostgresAdapterError {
    pub(crate) fn into_setup(self) -> BenchError {
        match self {
            PostgresAdapterError::Closed => BenchError::Closed(BACKEND_NAME.to_string()),
            other => BenchError::setup(BACKEND_NAME, other),
        }
    }

    pub(crate) fn into_operation(self) -> BenchError {
        match self {
            PostgresAdapterError::Closed => BenchError::Closed(BACKEND_NAME.to_string()),
            other => BenchError::operation(BACKEND_NAME, other),
        }
    }
}
