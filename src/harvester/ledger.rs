//! Per-page run ledger handle
//!
//! Workers report every processed page here. The ledger is bookkeeping only:
//! a failed write is logged and never affects the harvest itself.

use crate::state::{PageNumber, PageStatus};
use crate::storage::{SqliteStorage, Storage};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle writing page rows for one run
#[derive(Clone)]
pub struct PageLedger {
    storage: Arc<Mutex<SqliteStorage>>,
    run_id: i64,
}

impl PageLedger {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    fn lock(&self) -> MutexGuard<'_, SqliteStorage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records how a page ended
    ///
    /// `worker_id` is `None` for the bootstrap page.
    pub fn record(
        &self,
        page: PageNumber,
        status: PageStatus,
        item_count: usize,
        worker_id: Option<u32>,
        error_message: Option<&str>,
    ) {
        let result = self.lock().record_page(
            self.run_id,
            page,
            status,
            item_count as u64,
            worker_id,
            error_message,
        );

        if let Err(e) = result {
            tracing::warn!("Failed to record page {} in ledger: {}", page, e);
        }
    }
}
