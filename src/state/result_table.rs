//! Shared page-number to outcome mapping
//!
//! Each page number is dequeued by exactly one worker, so every key has a
//! single writer. The mutex only makes each insert atomic; it is never held
//! across an await point.

use crate::state::{IdentifierSet, PageNumber, PageOutcome};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Page outcomes collected during a run
#[derive(Debug, Default)]
pub struct ResultTable {
    entries: Mutex<BTreeMap<PageNumber, PageOutcome>>,
}

impl ResultTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PageNumber, PageOutcome>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the outcome of a page, returning any previous outcome
    ///
    /// A previous outcome only exists if a page was processed twice, which the
    /// queue's single-ownership dequeue rules out.
    pub fn record(&self, page: PageNumber, outcome: PageOutcome) -> Option<PageOutcome> {
        let previous = self.lock().insert(page, outcome);
        if previous.is_some() {
            tracing::warn!("Page {} was recorded more than once", page);
        }
        previous
    }

    /// Returns the outcome recorded for a page
    pub fn get(&self, page: PageNumber) -> Option<PageOutcome> {
        self.lock().get(&page).cloned()
    }

    /// Number of pages recorded so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Lowest page number that carries a repeat signal
    pub fn first_repeat(&self) -> Option<PageNumber> {
        self.lock()
            .iter()
            .find(|(_, outcome)| outcome.is_repeat())
            .map(|(page, _)| *page)
    }

    /// Union of every `Items` outcome, sorted and deduplicated
    ///
    /// Repeat signals are skipped but do not truncate. This is the snapshot
    /// view of partial progress.
    pub fn flatten(&self) -> Vec<String> {
        let entries = self.lock();
        let union: IdentifierSet = entries
            .values()
            .filter_map(PageOutcome::items)
            .flatten()
            .cloned()
            .collect();
        union.into_iter().collect()
    }

    /// Final merge: identifiers of every page before the first repeat signal
    ///
    /// Pages are walked in ascending order and accumulation stops at the first
    /// `RepeatSignal`; anything numbered after it is discarded.
    pub fn compile(&self) -> Vec<String> {
        let entries = self.lock();
        let mut union = IdentifierSet::new();

        for outcome in entries.values() {
            match outcome {
                PageOutcome::RepeatSignal => break,
                PageOutcome::Items(items) => union.extend(items.iter().cloned()),
            }
        }

        union.into_iter().collect()
    }
}
