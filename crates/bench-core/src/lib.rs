//! Core types for the hybrid-bench load testing harness.
//!
//! This crate provides the types shared by the generator, the backend
//! adapters, and the harness:
//!
//! - [`SyntheticRecord`] - One fake transaction row for the insert benchmark
//! - [`BusinessRecord`] - A partitioned row for the watermark join benchmark
//! - [`Watermark`] - Per-partition (and per-pipeline) processing marker
//! - [`QueryParams`] - Parameters of one timed watermark join query
//! - [`Backend`] / [`FireAndForget`] - Capabilities every adapter exposes
//! - [`BenchError`] - Error taxonomy surfaced to the harness
//!
//! # Architecture
//!
//! ```text
//! bench-core (this crate)
//!    │
//!    ├─── bench-generator     (produces records and watermarks)
//!    │
//!    ├─── bench-postgresql    (implements Backend for PostgreSQL)
//!    ├─── bench-snowflake     (implements Backend + FireAndForget for Snowflake)
//!    │
//!    └─── bench-harness       (drives any Backend)
//! ```

pub mod backend;
pub mod error;
pub mod query;
pub mod record;
pub mod watermark;

pub use backend::{Backend, BackendKind, FireAndForget, SchemaSpec};
pub use error::BenchError;
pub use query::{QueryParams, ResultMode};
pub use record::{
    Browser, BusinessRecord, Device, PaymentMethod, RecordMetadata, Status, SyntheticRecord,
    TrafficSource,
};
pub use watermark::{
    partition_key, pipeline_id, Watermark, WatermarkLayout, WatermarkUniverse,
};
