//! Error taxonomy shared by every backend and the harness.

use thiserror::Error;

/// Errors surfaced by backends, the loader, and the workload driver.
///
/// None of these are retried. Each one aborts the run it occurs in.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Schema creation or connection failure before any timing began.
    #[error("Setup error ({backend}): {message}")]
    Setup { backend: String, message: String },

    /// A single insert or query failed mid-run.
    #[error("Operation error ({backend}): {message}")]
    Operation { backend: String, message: String },

    /// The query phase found no seeded partitions or pipelines.
    #[error("No workload data: {0}")]
    NoWorkloadData(String),

    /// A random date range whose start lies after its end.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    /// The backend was used after `close()`.
    #[error("Backend '{0}' is closed")]
    Closed(String),

    /// The backend does not offer the requested capability.
    #[error("Backend '{backend}' does not support {capability}")]
    Unsupported { backend: String, capability: String },
}

impl BenchError {
    pub fn setup(backend: impl Into<String>, message: impl ToString) -> Self {
        BenchError::Setup {
            backend: backend.into(),
            message: message.to_string(),
        }
    }

    pub fn operation(backend: impl Into<String>, message: impl ToString) -> Self {
        BenchError::Operation {
            backend: backend.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BenchError::setup("PostgreSQL", "connection refused");
        assert_eq!(
            err.to_string(),
            "Setup error (PostgreSQL): connection refused"
        );

        let err = BenchError::InvalidRange {
            start: "2020-01-02".into(),
            end: "2020-01-01".into(),
        };
        assert!(err.to_string().contains("2020-01-02"));
    }
}
