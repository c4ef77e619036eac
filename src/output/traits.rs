//! Output handler traits and types
//!
//! This module defines the snapshot persistence interface and the run summary
//! rendered at the end of a harvest.

use crate::state::{PageNumber, PageStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Persistence collaborator for identifier snapshots
///
/// Every call replaces the previous snapshot; nothing is appended.
/// Implementations must be thread-safe.
pub trait SnapshotWriter: Send + Sync {
    /// Writes the sorted, deduplicated identifiers
    fn write(&self, identifiers: &[String]) -> OutputResult<()>;

    /// Human-readable location of the snapshot, for logs
    fn location(&self) -> String;
}

/// Summary of a harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Result
    pub identifier_count: Option<u64>,
    pub repeat_page: Option<PageNumber>,

    // Page breakdown (status -> count)
    pub pages_by_status: HashMap<PageStatus, u64>,

    // Failed pages with their last error
    pub failed_pages: Vec<(PageNumber, String)>,
}

impl HarvestSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages with the given status
    pub fn pages(&self, status: PageStatus) -> u64 {
        self.pages_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Total number of pages processed in the run
    pub fn total_pages(&self) -> u64 {
        self.pages_by_status.values().sum()
    }

    /// Share of processed pages that failed to load, as a percentage
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_pages();
        if total == 0 {
            return 0.0;
        }
        (self.pages(PageStatus::Failed) as f64 / total as f64) * 100.0
    }
}
