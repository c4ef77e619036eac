//! Storage traits and error types

use crate::state::{PageNumber, PageStatus};
use crate::storage::{PageRecord, RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Page {page} already recorded for run {run_id}")]
    DuplicatePage { run_id: i64, page: PageNumber },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for ledger backends
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run to finish
    /// * `status` - Completed or Failed
    /// * `identifier_count` - Size of the final identifier output, if any
    /// * `repeat_page` - First page that repeated page 1, if the end was detected
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        identifier_count: Option<u64>,
        repeat_page: Option<PageNumber>,
    ) -> StorageResult<()>;

    // ===== Page Outcomes =====

    /// Records how processing a page ended
    ///
    /// Fails with `DuplicatePage` if the page was already recorded for the run.
    fn record_page(
        &mut self,
        run_id: i64,
        page: PageNumber,
        status: PageStatus,
        item_count: u64,
        worker_id: Option<u32>,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Gets every page recorded for a run, in ascending page order
    fn get_page_records(&self, run_id: i64) -> StorageResult<Vec<PageRecord>>;

    // ===== Statistics =====

    /// Counts a run's pages with a given status
    fn count_pages_by_status(&self, run_id: i64, status: PageStatus) -> StorageResult<u64>;

    /// Gets the status breakdown of a run
    fn get_status_summary(&self, run_id: i64) -> StorageResult<HashMap<PageStatus, u64>>;
}
