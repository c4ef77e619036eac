//! Harvester module: concurrent collection of identifiers across catalog pages
//!
//! This module contains the core harvesting logic, including:
//! - The shared task queue and the cooperative stop flag
//! - Page fetching with a relaxed-readiness retry
//! - Identifier extraction from rendered pages
//! - The worker pool and the repeat-detection rule
//! - Result aggregation, snapshotting and run orchestration

mod aggregator;
mod coordinator;
mod extract;
mod fetcher;
mod ledger;
mod queue;
mod stop;
mod worker;

pub use aggregator::ResultAggregator;
pub use coordinator::{run_harvest, Coordinator};
pub use extract::IdentifierExtractor;
pub use fetcher::{fetch_page, FetchSettings, PageFetch};
pub use ledger::PageLedger;
pub use queue::{Task, TaskQueue};
pub use stop::StopFlag;
pub use worker::{run_worker, PageVerdict, WorkerContext, WorkerSummary};

use crate::state::PageNumber;
use std::fmt;
use std::time::Duration;

/// Why the worker pool was shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page served page 1's content again
    RepeatDetected,

    /// Every page below the ceiling was handed out without a repeat
    QueueExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RepeatDetected => write!(f, "catalog end detected"),
            Self::QueueExhausted => write!(f, "page ceiling reached"),
        }
    }
}

/// Outcome of a completed harvest run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// Ledger id of the run
    pub run_id: i64,

    /// Final sorted, deduplicated identifiers
    pub identifiers: Vec<String>,

    /// Pages with an entry in the result table, page 1 included
    pub pages_recorded: usize,

    /// Pages where both navigation attempts failed
    pub pages_failed: u64,

    /// Pages that rendered without identifiers
    pub pages_empty: u64,

    /// First page that repeated page 1
    pub repeat_page: Option<PageNumber>,

    pub stop_reason: StopReason,
    pub elapsed: Duration,
}
