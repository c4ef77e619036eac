//! Harvest coordinator - run orchestration
//!
//! This module sequences a complete run:
//! - Bootstrapping page 1 alone to capture the baseline identifier
//! - Filling the task queue and starting one worker per session
//! - Waiting for the catalog end or queue exhaustion
//! - Shutting the pool down and compiling the final identifier list

use crate::catalog::CatalogUrl;
use crate::config::{validate, Config};
use crate::harvester::aggregator::ResultAggregator;
use crate::harvester::extract::IdentifierExtractor;
use crate::harvester::fetcher::{fetch_page, FetchSettings, PageFetch};
use crate::harvester::ledger::PageLedger;
use crate::harvester::queue::{Task, TaskQueue};
use crate::harvester::stop::StopFlag;
use crate::harvester::worker::{run_worker, WorkerContext, WorkerSummary};
use crate::harvester::{HarvestReport, StopReason};
use crate::output::{generate_markdown_summary, generate_summary, CsvSnapshotWriter, SnapshotWriter};
use crate::render::{discover_websocket_url, CdpBackend, RenderBackend, RenderSession};
use crate::state::{PageOutcome, PageStatus};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::HarvestError;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Main harvest coordinator structure
pub struct Coordinator<B: RenderBackend> {
    config: Arc<Config>,
    catalog: CatalogUrl,
    backend: B,
    storage: Arc<Mutex<SqliteStorage>>,
    aggregator: Arc<ResultAggregator>,
    config_hash: String,
}

impl<B: RenderBackend> Coordinator<B> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration, validated here
    /// * `backend` - Source of rendering sessions
    /// * `storage` - Run ledger
    /// * `writer` - Persistence collaborator for snapshots
    /// * `config_hash` - Hash of the configuration file, stored with the run
    pub fn new(
        config: Config,
        backend: B,
        storage: SqliteStorage,
        writer: Box<dyn SnapshotWriter>,
        config_hash: impl Into<String>,
    ) -> Result<Self, HarvestError> {
        // A pool without workers would never drain the queue
        validate(&config)?;
        let catalog = CatalogUrl::new(&config.catalog.url_template, config.catalog.page_size)?;

        Ok(Self {
            config: Arc::new(config),
            catalog,
            backend,
            storage: Arc::new(Mutex::new(storage)),
            aggregator: Arc::new(ResultAggregator::new(writer)),
            config_hash: config_hash.into(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gives the backend back, e.g. to detach from the browser
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Shared handle to the run ledger
    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    fn lock_storage(&self) -> MutexGuard<'_, SqliteStorage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch_settings(&self, settle_ms: u64) -> FetchSettings {
        FetchSettings {
            navigation_timeout: Duration::from_millis(self.config.browser.navigation_timeout_ms),
            settle_delay: Duration::from_millis(settle_ms),
        }
    }

    fn extractor(&self) -> IdentifierExtractor {
        IdentifierExtractor::new(
            &self.config.browser.extraction_script,
            &self.config.browser.identifier_field,
        )
    }

    /// Runs a complete harvest
    ///
    /// The run is recorded in the ledger; a fatal error marks it failed.
    pub async fn run(&mut self) -> Result<HarvestReport, HarvestError> {
        let run_id = self.lock_storage().create_run(&self.config_hash)?;
        tracing::info!("Starting harvest run {}", run_id);

        match self.harvest(run_id).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!("Harvest run {} failed: {}", run_id, e);
                if let Err(finish_err) =
                    self.lock_storage()
                        .finish_run(run_id, RunStatus::Failed, None, None)
                {
                    tracing::warn!("Could not mark run {} as failed: {}", run_id, finish_err);
                }
                Err(e)
            }
        }
    }

    async fn harvest(&self, run_id: i64) -> Result<HarvestReport, HarvestError> {
        let start_time = Instant::now();
        let ledger = PageLedger::new(self.storage(), run_id);

        // Page 1 alone, before any worker exists
        let baseline = self.bootstrap(&ledger).await?;
        tracing::info!("Baseline identifier: {}", baseline);

        let workers = self.config.browser.workers;
        let ctx = Arc::new(WorkerContext {
            catalog: self.catalog.clone(),
            settings: self.fetch_settings(self.config.browser.settle_delay_ms),
            extractor: self.extractor(),
            queue: TaskQueue::with_pages(2..self.config.catalog.upper_bound),
            stop: StopFlag::new(),
            aggregator: Arc::clone(&self.aggregator),
            ledger,
            baseline,
        });
        tracing::info!(
            "Queued {} pages for {} workers",
            ctx.queue.len(),
            workers
        );

        let mut sessions = Vec::with_capacity(workers as usize);
        for _ in 0..workers {
            match self.backend.open_session().await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    close_sessions(sessions).await;
                    return Err(e.into());
                }
            }
        }

        let handles: Vec<_> = sessions
            .into_iter()
            .enumerate()
            .map(|(worker_id, session)| {
                tokio::spawn(run_worker(worker_id as u32, session, Arc::clone(&ctx)))
            })
            .collect();

        tokio::select! {
            _ = ctx.stop.wait() => tracing::info!("Stop flag observed"),
            _ = ctx.queue.wait_until_empty() => tracing::info!("Task queue exhausted"),
        }

        ctx.stop.set();
        let drained = ctx.queue.try_dequeue_all();
        if drained > 0 {
            tracing::debug!("Drained {} pending pages", drained);
        }
        for _ in 0..workers {
            ctx.queue.enqueue(Task::Shutdown);
        }

        let mut sessions = Vec::with_capacity(workers as usize);
        let mut summaries: Vec<WorkerSummary> = Vec::with_capacity(workers as usize);
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok((session, summary)) => {
                    tracing::debug!(
                        "[Worker {}] Terminated after {} pages",
                        summary.worker_id,
                        summary.pages_processed
                    );
                    sessions.push(session);
                    summaries.push(summary);
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }
        close_sessions(sessions).await;

        let identifiers = self.aggregator.compile();
        self.aggregator.persist(&identifiers);

        let repeat_page = self.aggregator.first_repeat();
        let stop_reason = match repeat_page {
            Some(_) => StopReason::RepeatDetected,
            None => StopReason::QueueExhausted,
        };

        let (pages_failed, pages_empty) = {
            let mut storage = self.lock_storage();
            storage.finish_run(
                run_id,
                RunStatus::Completed,
                Some(identifiers.len() as u64),
                repeat_page,
            )?;
            (
                storage.count_pages_by_status(run_id, PageStatus::Failed)?,
                storage.count_pages_by_status(run_id, PageStatus::Empty)?,
            )
        };

        self.write_summary();

        let pages_processed: u32 = summaries.iter().map(|s| s.pages_processed).sum();
        tracing::info!(
            "Harvest run {} finished: {} unique identifiers from {} pages ({}) in {:.1}s",
            run_id,
            identifiers.len(),
            pages_processed + 1,
            stop_reason,
            start_time.elapsed().as_secs_f64()
        );

        Ok(HarvestReport {
            run_id,
            pages_recorded: self.aggregator.pages_recorded(),
            identifiers,
            pages_failed,
            pages_empty,
            repeat_page,
            stop_reason,
            elapsed: start_time.elapsed(),
        })
    }

    /// Fetches page 1 and returns its first identifier
    async fn bootstrap(&self, ledger: &PageLedger) -> Result<String, HarvestError> {
        let url = self.catalog.page_url(1)?;
        let settings = self.fetch_settings(self.config.browser.bootstrap_settle_ms);
        let extractor = self.extractor();

        tracing::info!("Bootstrapping from {}", url);
        let mut session = self.backend.open_session().await?;
        let fetch = fetch_page(&mut session, &url, settings, &extractor).await;
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close bootstrap session: {}", e);
        }

        let ids = match fetch {
            PageFetch::Loaded(ids) if !ids.is_empty() => ids,
            PageFetch::Loaded(_) => {
                ledger.record(1, PageStatus::Empty, 0, None, None);
                return Err(HarvestError::BaselineUnavailable {
                    url: url.to_string(),
                });
            }
            PageFetch::Failed { error } => {
                ledger.record(1, PageStatus::Failed, 0, None, Some(&error));
                return Err(HarvestError::BaselineUnavailable {
                    url: url.to_string(),
                });
            }
        };

        tracing::info!("Found {} products on page 1", ids.len());
        let baseline = ids[0].clone();
        ledger.record(1, PageStatus::Loaded, ids.len(), None, None);
        self.aggregator.record(1, PageOutcome::from_sequence(ids));
        self.aggregator.snapshot();

        Ok(baseline)
    }

    fn write_summary(&self) {
        let Some(path) = &self.config.output.summary_path else {
            return;
        };

        let storage = self.lock_storage();
        let result = generate_summary(&*storage).and_then(|summary| {
            generate_markdown_summary(&summary, Path::new(path)).map_err(HarvestError::from)
        });

        match result {
            Ok(()) => tracing::info!("Summary written to {}", path),
            Err(e) => tracing::warn!("Failed to write summary to {}: {}", path, e),
        }
    }
}

async fn close_sessions<S: RenderSession>(sessions: Vec<S>) {
    for mut session in sessions {
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close session: {}", e);
        }
    }
}

/// Runs a harvest against the browser named by the configuration
///
/// Discovers the browser's DevTools socket, attaches, runs the coordinator
/// and detaches again. Discovery or attach failures abort before a run is
/// recorded.
pub async fn run_harvest(
    config: Config,
    config_hash: impl Into<String>,
) -> Result<HarvestReport, HarvestError> {
    let ws_url = discover_websocket_url(&config.browser.debug_endpoint).await?;
    let backend = CdpBackend::connect(&ws_url).await?;

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let writer = CsvSnapshotWriter::new(&config.output.snapshot_path);

    let mut coordinator = Coordinator::new(config, backend, storage, Box::new(writer), config_hash)?;
    let result = coordinator.run().await;
    coordinator.into_backend().disconnect().await;

    result
}
