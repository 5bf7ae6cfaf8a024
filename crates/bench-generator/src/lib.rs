//! Synthetic data generator for the hybrid-bench harness.
//!
//! This crate provides the [`RecordGenerator`] which produces fake
//! transaction records, plus the helpers the join workload uses to build
//! business rows and watermarks.
//!
//! # Architecture
//!
//! ```text
//!        seed (optional)
//!              │
//!              ▼
//! ┌─────────────────────────┐
//! │     RecordGenerator     │
//! │                         │
//! │  - seed                 │
//! │  - transaction window   │
//! └────────────┬────────────┘
//!              │ record_at(index)
//!              ▼
//!   SyntheticRecord { id, user_id, ..., metadata }
//! ```
//!
//! `record_at` takes `&self` and builds a private RNG per call, so any number
//! of tasks can generate records at once without synchronization. With a
//! seed, record `i` is the same on every run regardless of which task
//! produced it.
//!
//! # Example
//!
//! ```rust
//! use bench_generator::RecordGenerator;
//!
//! let generator = RecordGenerator::new(Some(42));
//! let record = generator.record_at(0);
//! assert_eq!(record, generator.record_at(0));
//! ```

pub mod generator;
pub mod generators;

pub use generator::{RecordGenerator, TransactionWindow};
pub use generators::timestamp::generate_random_date;
pub use generators::watermark::generate_watermark;
pub use generators::GeneratorError;
