//! Pool worker
//!
//! # Worker Loop
//!
//! 1. Check the stop flag; terminate if set
//! 2. Block on the task queue, or terminate if the flag is set while waiting
//! 3. Terminate on a shutdown task
//! 4. Fetch the page with the worker's own session
//! 5. Record the outcome:
//!    - empty page (or hard failure): `Items(∅)`
//!    - first identifier equals the baseline on a page other than 1: `RepeatSignal`,
//!      set the stop flag, drain the queue and terminate
//!    - otherwise `Items`, then snapshot

use crate::catalog::CatalogUrl;
use crate::harvester::aggregator::ResultAggregator;
use crate::harvester::extract::IdentifierExtractor;
use crate::harvester::fetcher::{fetch_page, FetchSettings, PageFetch};
use crate::harvester::ledger::PageLedger;
use crate::harvester::queue::{Task, TaskQueue};
use crate::harvester::stop::StopFlag;
use crate::render::RenderSession;
use crate::state::{PageNumber, PageOutcome, PageStatus};
use std::sync::Arc;

/// State shared by every worker of a run
pub struct WorkerContext {
    pub catalog: CatalogUrl,
    pub settings: FetchSettings,
    pub extractor: IdentifierExtractor,
    pub queue: TaskQueue,
    pub stop: StopFlag,
    pub aggregator: Arc<ResultAggregator>,
    pub ledger: PageLedger,

    /// First identifier of page 1
    pub baseline: String,
}

/// What a worker did before terminating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: u32,
    pub pages_processed: u32,
    pub repeat_detected: bool,
}

/// Classification of one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    /// Navigation failed twice
    Failed { error: String },

    /// Page rendered without identifiers
    Empty,

    /// Page served page 1's content again
    Repeat,

    /// Page listed identifiers
    Items(Vec<String>),
}

impl PageVerdict {
    /// Applies the repeat-detection rule to a fetch result
    pub fn classify(page: PageNumber, fetch: PageFetch, baseline: &str) -> Self {
        match fetch {
            PageFetch::Failed { error } => Self::Failed { error },
            PageFetch::Loaded(ids) if ids.is_empty() => Self::Empty,
            PageFetch::Loaded(ids) if page != 1 && ids[0] == baseline => Self::Repeat,
            PageFetch::Loaded(ids) => Self::Items(ids),
        }
    }
}

/// Runs one worker until it terminates
///
/// The session is handed back so the caller can close it.
pub async fn run_worker<S: RenderSession>(
    worker_id: u32,
    mut session: S,
    ctx: Arc<WorkerContext>,
) -> (S, WorkerSummary) {
    let mut summary = WorkerSummary {
        worker_id,
        ..WorkerSummary::default()
    };

    loop {
        if ctx.stop.is_set() {
            tracing::debug!("[Worker {}] Stop flag set, terminating", worker_id);
            break;
        }

        // A page is either taken before the flag is observed, and then
        // processed like any in-flight page, or left in the queue for the
        // drain. A taken page is never dropped.
        let task = tokio::select! {
            biased;
            _ = ctx.stop.wait() => {
                tracing::debug!("[Worker {}] Stop flag set while waiting", worker_id);
                break;
            }
            task = ctx.queue.dequeue() => task,
        };

        let page = match task {
            Task::Shutdown => {
                tracing::debug!("[Worker {}] Shutdown received", worker_id);
                break;
            }
            Task::Page(page) => page,
        };

        summary.pages_processed += 1;
        if process_page(worker_id, page, &mut session, &ctx).await == PageStatus::Repeat {
            summary.repeat_detected = true;
            break;
        }
    }

    (session, summary)
}

async fn process_page<S: RenderSession>(
    worker_id: u32,
    page: PageNumber,
    session: &mut S,
    ctx: &WorkerContext,
) -> PageStatus {
    let fetch = match ctx.catalog.page_url(page) {
        Ok(url) => {
            tracing::info!("[Worker {}] Loading page {}", worker_id, page);
            fetch_page(session, &url, ctx.settings, &ctx.extractor).await
        }
        Err(e) => PageFetch::Failed {
            error: e.to_string(),
        },
    };

    match PageVerdict::classify(page, fetch, &ctx.baseline) {
        PageVerdict::Failed { error } => {
            tracing::warn!("[Worker {}] Hard fail on page {}: {}", worker_id, page, error);
            ctx.aggregator.record(page, PageOutcome::empty());
            ctx.ledger
                .record(page, PageStatus::Failed, 0, Some(worker_id), Some(&error));
            PageStatus::Failed
        }
        PageVerdict::Empty => {
            tracing::info!("[Worker {}] No products on page {}", worker_id, page);
            ctx.aggregator.record(page, PageOutcome::empty());
            ctx.ledger
                .record(page, PageStatus::Empty, 0, Some(worker_id), None);
            PageStatus::Empty
        }
        PageVerdict::Repeat => {
            tracing::info!(
                "[Worker {}] Page {} repeats page 1, catalog end reached",
                worker_id,
                page
            );
            ctx.aggregator.record(page, PageOutcome::RepeatSignal);
            ctx.ledger
                .record(page, PageStatus::Repeat, 0, Some(worker_id), None);

            if ctx.stop.set() {
                tracing::info!("[Worker {}] Global stop set", worker_id);
            }
            let discarded = ctx.queue.try_dequeue_all();
            tracing::debug!("[Worker {}] Drained {} queued tasks", worker_id, discarded);
            PageStatus::Repeat
        }
        PageVerdict::Items(ids) => {
            tracing::info!(
                "[Worker {}] Found {} products on page {}",
                worker_id,
                ids.len(),
                page
            );
            let count = ids.len();
            ctx.aggregator.record(page, PageOutcome::from_sequence(ids));
            ctx.ledger
                .record(page, PageStatus::Loaded, count, Some(worker_id), None);
            ctx.aggregator.snapshot();
            PageStatus::Loaded
        }
    }
}
