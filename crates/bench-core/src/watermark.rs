//! Watermark rows and the partition/pipeline universe of the join benchmark.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Key of the `n`-th partition (1-based).
pub fn partition_key(n: u32) -> String {
    format!("partition_{n}")
}

/// Id of the `n`-th pipeline (1-based).
pub fn pipeline_id(n: u32) -> String {
    format!("pipeline_{n}")
}

/// How watermark rows are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkLayout {
    /// One watermark per partition.
    Single,
    /// One watermark per (partition, pipeline) pair.
    MultiPipeline,
}

impl WatermarkLayout {
    pub fn for_pipelines(num_pipelines: u32) -> Self {
        if num_pipelines > 1 {
            WatermarkLayout::MultiPipeline
        } else {
            WatermarkLayout::Single
        }
    }
}

/// "Data processed up to this point" marker for a partition or pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    pub partition_key: String,
    pub pipeline_id: Option<String>,
    pub last_processed_date: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Watermark {
    /// Build a watermark, rejecting `updated_at` earlier than `last_processed_date`.
    pub fn new(
        partition_key: impl Into<String>,
        pipeline_id: Option<String>,
        last_processed_date: NaiveDateTime,
        updated_at: NaiveDateTime,
    ) -> Option<Self> {
        if updated_at < last_processed_date {
            return None;
        }
        Some(Self {
            partition_key: partition_key.into(),
            pipeline_id,
            last_processed_date,
            updated_at,
        })
    }
}

/// Distinct partitions and pipelines found in the watermark table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatermarkUniverse {
    pub partitions: Vec<String>,
    /// Empty for [`WatermarkLayout::Single`].
    pub pipelines: Vec<String>,
}

impl WatermarkUniverse {
    /// True when no query can be formed from this universe.
    pub fn is_empty(&self, layout: WatermarkLayout) -> bool {
        match layout {
            WatermarkLayout::Single => self.partitions.is_empty(),
            WatermarkLayout::MultiPipeline => {
                self.partitions.is_empty() || self.pipelines.is_empty()
            }
        }
    }
}
