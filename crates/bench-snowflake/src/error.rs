//! Error types for the Snowflake adapter.

use bench_core::BenchError;
use thiserror::Error;

pub(crate) const BACKEND_NAME: &str = "Snowflake Hybrid Tables";

/// Errors that can occur while talking to Snowflake.
#[derive(Error, Debug)]
pub enum SnowflakeError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The SQL API rejected or failed a statement.
    #[error("Snowflake error {code} (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// A response body the adapter could not interpret.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Connection profile problems.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse connections file: {0}")]
    Toml(#[from] toml::de::Error),

    /// The adapter was used after `close()`.
    #[error("Backend is closed")]
    Closed,
}

impl SnowflakeError {
    pub(crate) fn into_setup(self) -> BenchError {
        match self {
            SnowflakeError::Closed => BenchError::Closed(BACKEND_NAME.to_string()),
            other => BenchError::setup(BACKEND_NAME, other),
        }
    }

    pub(crate) fn into_operation(self) -> BenchError {
        match self {
            SnowflakeError::Closed => BenchError::Closed(BACKEND_NAME.to_string()),
            other => BenchError::operation(BACKEND_NAME, other),
        }
    }
}
