//! Output module for snapshots, statistics and run summaries
//!
//! This module handles:
//! - Persisting identifier snapshots as CSV
//! - Generating markdown summaries of harvest runs
//! - Printing ledger statistics

mod markdown;
mod snapshot;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use snapshot::{read_snapshot, CsvSnapshotWriter, IDENTIFIER_COLUMN};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use traits::{HarvestSummary, OutputError, OutputResult, SnapshotWriter};

use crate::storage::Storage;
use crate::HarvestError;

/// Generates a summary of the latest harvest run from storage
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - Successfully generated summary
/// * `Err(HarvestError)` - No run exists or the ledger could not be read
pub fn generate_summary(storage: &dyn Storage) -> Result<HarvestSummary, HarvestError> {
    let stats = stats::load_statistics(storage)?;
    let run = stats.run;

    let duration_seconds = match (
        run.started_at.parse::<chrono::DateTime<chrono::Utc>>(),
        run.finished_at
            .as_deref()
            .map(str::parse::<chrono::DateTime<chrono::Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    Ok(HarvestSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        identifier_count: run.identifier_count,
        repeat_page: run.repeat_page,
        pages_by_status: stats.pages_by_status,
        failed_pages: stats.failed_pages,
    })
}
