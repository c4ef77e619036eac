//! Result aggregation and snapshotting
//!
//! Wraps the [`ResultTable`] with the persistence collaborator. Snapshots are
//! serialized so two workers finishing at once never write the file
//! concurrently; a failed write is logged and the run carries on.

use crate::output::SnapshotWriter;
use crate::state::{PageNumber, PageOutcome, ResultTable};
use std::sync::{Mutex, PoisonError};

/// Shared result table plus its snapshot writer
pub struct ResultAggregator {
    table: ResultTable,
    writer: Box<dyn SnapshotWriter>,
    write_lock: Mutex<()>,
}

impl ResultAggregator {
    pub fn new(writer: Box<dyn SnapshotWriter>) -> Self {
        Self {
            table: ResultTable::new(),
            writer,
            write_lock: Mutex::new(()),
        }
    }

    /// Records the outcome of a page
    pub fn record(&self, page: PageNumber, outcome: PageOutcome) {
        self.table.record(page, outcome);
    }

    /// Flattens everything recorded so far and persists it
    ///
    /// Returns the number of identifiers written, or `None` if the write
    /// failed.
    pub fn snapshot(&self) -> Option<usize> {
        let identifiers = self.table.flatten();
        self.persist(&identifiers)
    }

    /// Persists an already merged identifier list
    pub fn persist(&self, identifiers: &[String]) -> Option<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        match self.writer.write(identifiers) {
            Ok(()) => {
                tracing::info!(
                    "[auto-save] {} unique identifiers saved to {}",
                    identifiers.len(),
                    self.writer.location()
                );
                Some(identifiers.len())
            }
            Err(e) => {
                tracing::warn!(
                    "Snapshot to {} failed, continuing: {}",
                    self.writer.location(),
                    e
                );
                None
            }
        }
    }

    /// Final merge, truncated at the first repeat signal
    pub fn compile(&self) -> Vec<String> {
        self.table.compile()
    }

    /// Lowest page that repeated page 1, if any
    pub fn first_repeat(&self) -> Option<PageNumber> {
        self.table.first_repeat()
    }

    /// Number of pages recorded
    pub fn pages_recorded(&self) -> usize {
        self.table.len()
    }

    pub fn outcome(&self, page: PageNumber) -> Option<PageOutcome> {
        self.table.get(page)
    }
}
