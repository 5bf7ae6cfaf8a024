//! Bounded connection pool for timed PostgreSQL operations.
//!
//! A thin layer over `deadpool-postgres`. `acquire()` waits until one of
//! `max_size` connections is free, opening a new one when none is idle, and
//! hands it out exclusively. Dropping the returned object releases it.
//! Statements are prepared once per connection through `prepare_cached`.

use crate::error::PostgresAdapterError;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::{Client, Config, NoTls};
use tracing::debug;

/// Connection handed out by [`ConnectionPool::acquire`].
pub type PooledConnection = Object;

/// Open a connection outside any pool and spawn its driver task.
pub async fn connect_direct(config: &Config) -> Result<Client, PostgresAdapterError> {
    let (client, connection) = config.connect(NoTls).await?;

    // Spawn the connection task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {}", e);
        }
    });

    Ok(client)
}

/// Pool of PostgreSQL connections bounded by `max_size`.
pub struct ConnectionPool {
    pool: Pool,
}

impl ConnectionPool {
    /// Build an empty pool. No connection is opened until [`acquire`](Self::acquire)
    /// or [`warm_up`](Self::warm_up).
    pub fn new(config: Config, max_size: usize) -> Result<Self, PostgresAdapterError> {
        let manager = Manager::from_config(
            config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager).max_size(max_size.max(1)).build()?;
        Ok(Self { pool })
    }

    /// Build a pool and open `min_size` connections up front.
    pub async fn open(
        config: Config,
        min_size: usize,
        max_size: usize,
    ) -> Result<Self, PostgresAdapterError> {
        let pool = Self::new(config, max_size)?;
        pool.warm_up(min_size).await?;
        Ok(pool)
    }

    /// Open connections until at least `count` (capped at `max_size`) exist.
    pub async fn warm_up(&self, count: usize) -> Result<(), PostgresAdapterError> {
        let count = count.min(self.max_size());
        let mut held = Vec::with_capacity(count);
        while self.size() < count {
            held.push(self.acquire().await?);
        }
        drop(held);
        debug!(
            "Opened PostgreSQL pool with {} connections (max {})",
            self.size(),
            self.max_size()
        );
        Ok(())
    }

    pub fn max_size(&self) -> usize {
        self.pool.status().max_size
    }

    /// Connections currently open, idle or in use.
    pub fn size(&self) -> usize {
        self.pool.status().size
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Borrow a connection, waiting while all `max_size` are in use.
    ///
    /// Idle connections whose socket was closed are discarded and replaced.
    pub async fn acquire(&self) -> Result<PooledConnection, PostgresAdapterError> {
        Ok(self.pool.get().await?)
    }

    /// Refuse further acquisitions and drop idle connections. Connections
    /// still borrowed are dropped when returned.
    pub fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        self.pool.close();
        debug!("Closed PostgreSQL pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> Config {
        let mut config = Config::new();
        config
            .host("127.0.0.1")
            .port(9)
            .user("bench")
            .dbname("bench")
            .connect_timeout(std::time::Duration::from_secs(2));
        config
    }

    #[test]
    fn test_new_pool_is_empty_and_bounded() {
        let pool = ConnectionPool::new(unreachable_config(), 8).unwrap();
        assert_eq!(pool.max_size(), 8);
        assert_eq!(pool.size(), 0);
        assert!(!pool.is_closed());
    }

    #[test]
    fn test_max_size_floor() {
        let pool = ConnectionPool::new(unreachable_config(), 0).unwrap();
        assert_eq!(pool.max_size(), 1);
    }

    #[tokio::test]
    async fn test_acquire_after_close_is_rejected() {
        let pool = ConnectionPool::new(unreachable_config(), 2).unwrap();
        pool.close();
        pool.close();
        assert!(pool.is_closed());

        let result = pool.acquire().await;
        assert!(matches!(result, Err(PostgresAdapterError::PoolClosed)));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_no_connection() {
        let pool = ConnectionPool::new(unreachable_config(), 2).unwrap();
        assert!(pool.acquire().await.is_err());
        assert_eq!(pool.size(), 0);
    }

    fn live_config() -> Config {
        std::env::var("BENCH_POSTGRES_URL")
            .expect("BENCH_POSTGRES_URL")
            .parse()
            .unwrap()
    }

    /// Requires a running PostgreSQL reachable through `BENCH_POSTGRES_URL`.
    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_grows_on_demand_up_to_max() {
        let pool = ConnectionPool::open(live_config(), 1, 3).await.unwrap();
        assert_eq!(pool.size(), 1);

        let first = pool.acquire().await.unwrap();
        let second = pool.acquire().await.unwrap();
        assert_eq!(pool.size(), 2);
        drop(first);
        drop(second);

        // both return to the pool and are reused
        let _again = pool.acquire().await.unwrap();
        assert_eq!(pool.size(), 2);
    }

    /// Requires a running PostgreSQL reachable through `BENCH_POSTGRES_URL`.
    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_returned_after_close_is_dropped() {
        let pool = ConnectionPool::open(live_config(), 1, 2).await.unwrap();
        let conn = pool.acquire().await.unwrap();
        pool.close();
        drop(conn);
        assert_eq!(pool.size(), 0);
    }

    /// Requires a running PostgreSQL reachable through `BENCH_POSTGRES_URL`.
    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_broken_connection_is_replaced() {
        let pool = ConnectionPool::open(live_config(), 1, 1).await.unwrap();
        {
            let conn = pool.acquire().await.unwrap();
            // terminate our own backend; the socket closes underneath the client
            let _ = conn
                .batch_execute("SELECT pg_terminate_backend(pg_backend_pid())")
                .await;
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        let conn = pool.acquire().await.unwrap();
        let row = conn.query_one("SELECT 1::INT4", &[]).await.unwrap();
        assert_eq!(row.get::<_, i32>(0), 1);
    }
}
