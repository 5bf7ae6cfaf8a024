//! Snowflake backend for the hybrid-bench harness.
//!
//! The adapter speaks the Snowflake SQL API v2 over HTTPS. One session is
//! shared by every operation and created on first use. Statements are sent
//! with numbered `:N` placeholders and typed bindings.
//!
//! Besides confirmed inserts, the adapter offers fire-and-forget submission
//! (`async=true`) which returns as soon as Snowflake accepted a statement.
//! Rates measured that way are dispatch ceilings, not durable-write rates.

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod sql;

pub use adapter::SnowflakeBackend;
pub use api::{Binding, SqlApiSession, StatementResult};
pub use config::{ConnectionProfile, SnowflakeConnection, SnowflakeSettings};
pub use error::SnowflakeError;
