//! Drivers that put load on a [`bench_core::Backend`] and turn what they
//! measured into results.
//!
//! - [`RateControlledLoader`] inserts records at a target rate with bounded
//!   concurrency and per-batch pacing
//! - [`FireAndForgetLoader`] dispatches inserts without awaiting them, for
//!   backends that support it natively
//! - [`JoinWorkload`] seeds business rows and watermarks, then times the
//!   watermark join query
//! - [`run_insert_benchmark`] / [`run_join_benchmark`] wrap a full run:
//!   schema setup, the timed phase, verification and closing the backend
//!
//! [`testing::MemoryBackend`] is an in-process backend for exercising the
//! drivers without a database.

pub mod loader;
pub mod run;
pub mod testing;
pub mod workload;

pub use loader::{
    concurrency_bound, pacing_delay, FireAndForgetLoader, LoadMetrics, LoaderConfig,
    RateControlledLoader, DEFAULT_MAX_CONCURRENCY,
};
pub use run::{run_insert_benchmark, run_join_benchmark, InsertRunConfig};
pub use workload::{JoinConfig, JoinOutcome, JoinWorkload};
