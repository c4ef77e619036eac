//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `PageOutcome`: what processing a page produced (identifiers or a repeat signal)
//! - `ResultTable`: the shared page-number to outcome mapping
//! - `PageStatus`: the richer per-page status kept in the run ledger

mod page_outcome;
mod page_status;
mod result_table;

// Re-export main types
pub use page_outcome::{IdentifierSet, PageNumber, PageOutcome};
pub use page_status::PageStatus;
pub use result_table::ResultTable;
