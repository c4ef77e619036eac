//! Statistics generation from the run ledger
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::state::{PageNumber, PageStatus};
use crate::storage::{RunRecord, Storage};
use crate::HarvestError;
use std::collections::HashMap;

/// Harvest statistics for a single run
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// The run the statistics describe
    pub run: RunRecord,

    /// Total number of pages recorded in the ledger
    pub total_pages: u64,

    /// Count of pages by status
    pub pages_by_status: HashMap<PageStatus, u64>,

    /// Sum of identifiers reported per page (before deduplication)
    pub raw_identifiers: u64,

    /// Pages that failed to load, with the error of the last attempt
    pub failed_pages: Vec<(PageNumber, String)>,
}

/// Loads statistics for the most recent run
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - No run exists or the query failed
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, HarvestError> {
    let run = storage
        .get_latest_run()?
        .ok_or_else(|| HarvestError::Storage("No harvest runs found in database".to_string()))?;

    let pages_by_status = storage.get_status_summary(run.id)?;
    let records = storage.get_page_records(run.id)?;

    let raw_identifiers = records.iter().map(|r| r.item_count).sum();
    let failed_pages = records
        .iter()
        .filter(|r| r.status == PageStatus::Failed)
        .map(|r| {
            (
                r.page_number,
                r.error_message.clone().unwrap_or_else(|| "unknown".to_string()),
            )
        })
        .collect();

    Ok(HarvestStatistics {
        total_pages: records.len() as u64,
        run,
        pages_by_status,
        raw_identifiers,
        failed_pages,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Run {}:", stats.run.id);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!();

    println!("Overview:");
    println!("  Pages recorded: {}", stats.total_pages);
    println!("  Identifiers seen (with duplicates): {}", stats.raw_identifiers);
    if let Some(count) = stats.run.identifier_count {
        println!("  Unique identifiers: {}", count);
    }
    match stats.run.repeat_page {
        Some(page) => println!("  Catalog end detected at page {}", page),
        None => println!("  Catalog end not detected"),
    }
    println!();

    println!("Pages by Status:");
    let mut status_counts: Vec<_> = stats.pages_by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        let percentage = if stats.total_pages > 0 {
            (*count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    if !stats.failed_pages.is_empty() {
        println!("Failed Pages ({}):", stats.failed_pages.len());
        for (page, error) in &stats.failed_pages {
            println!("  - page {}: {}", page, error);
        }
        println!();
    }
}
