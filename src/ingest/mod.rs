//! Ingestion: turning stored photos into index entries
//!
//! A run walks the library once and produces a lazy stream of
//! [`ProgressEvent`]s that ends with exactly one `Completed` or `Failed`.

pub mod events;
pub mod pipeline;

pub use events::{ProgressEvent, ProgressTick, RunFailure, RunSummary};
pub use pipeline::{IngestionPipeline, ItemOutcome};

use serde::Deserialize;
use std::time::Duration;

/// Ingestion configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Delay between photos that hit the upstream services, in milliseconds
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

fn default_throttle_ms() -> u64 {
    500
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
        }
    }
}

impl IngestConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}
