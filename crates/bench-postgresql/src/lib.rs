//! PostgreSQL backend for the hybrid-bench harness.
//!
//! The adapter talks to PostgreSQL through `tokio-postgres`. Timed
//! operations borrow a connection from a bounded `deadpool-postgres` pool
//! that is created on first use; schema setup and row counts use a short-lived direct
//! connection so they never compete with the pool.

pub mod adapter;
pub mod error;
pub mod pool;
pub mod sql;

pub use adapter::{PostgresBackend, PostgresSettings, DEFAULT_POOL_MAX_SIZE, DEFAULT_POOL_MIN_SIZE};
pub use error::PostgresAdapterError;
pub use pool::{connect_direct, ConnectionPool, PooledConnection};
