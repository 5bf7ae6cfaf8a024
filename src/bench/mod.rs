//! Benchmark commands behind the CLI.

pub mod insert;
pub mod join;
mod logging;

pub use insert::{execute_insert, run_insert, InsertArgs, InsertPlan, SnowflakeMode};
pub use join::{execute_join, run_join, BenchmarkTarget, JoinArgs, ResultModeArg};
pub use logging::mask_connection_password;
