//! Progress events emitted by an ingestion run

use serde::Serialize;

/// One step of an ingestion run.
///
/// Serialized without a tag so each variant matches the frame shape the
/// client reads: ticks carry `progress`, the final frame carries
/// `complete: true`, and a fatal start failure carries `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgressEvent {
    Progress(ProgressTick),
    Completed(RunSummary),
    Failed(RunFailure),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }

    /// Items processed so far, when the event carries a count
    pub fn processed(&self) -> Option<usize> {
        match self {
            Self::Progress(tick) => Some(tick.processed),
            Self::Completed(summary) => Some(summary.processed),
            Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressTick {
    /// Integer percentage of `processed / total`
    pub progress: u8,
    pub processed: usize,
    pub total: usize,
    pub current_file: String,
}

impl ProgressTick {
    pub fn new(processed: usize, total: usize, current_file: impl Into<String>) -> Self {
        Self {
            progress: percent(processed, total),
            processed,
            total,
            current_file: current_file.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub complete: bool,
    pub processed: usize,
    pub total: usize,
    /// Entries written during this run
    pub indexed: usize,
    /// Items already present in the store
    pub skipped: usize,
    /// Items that produced no entry
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    pub error: String,
    pub message: String,
}

impl RunFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: "Processing failed".to_string(),
            message: message.into(),
        }
    }
}

fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (processed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
