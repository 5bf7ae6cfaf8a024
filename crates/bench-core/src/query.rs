//! Parameters of the watermark join query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much of the result a query materializes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    /// Fetch every matching row.
    #[default]
    Fetch,
    /// Retrieve only `COUNT(*)`.
    Count,
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultMode::Fetch => write!(f, "fetch"),
            ResultMode::Count => write!(f, "count"),
        }
    }
}

/// One execution of "business rows in this partition newer than its watermark".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub partition_key: String,
    /// Set only for the multi-pipeline layout.
    pub pipeline_id: Option<String>,
    pub mode: ResultMode,
}

impl QueryParams {
    pub fn new(partition_key: impl Into<String>, pipeline_id: Option<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            pipeline_id,
            mode: ResultMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ResultMode) -> Self {
        self.mode = mode;
        self
    }
}
