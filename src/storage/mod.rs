//! Storage module for the harvest run ledger
//!
//! The ledger keeps one row per run and one row per processed page. It is
//! where a hard page failure stays distinguishable from a legitimately empty
//! page, even though both merge identically into the identifier output.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::{PageNumber, PageStatus};

/// Represents a processed page in the ledger
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub run_id: i64,
    pub page_number: PageNumber,
    pub status: PageStatus,
    pub item_count: u64,
    pub worker_id: Option<u32>,
    pub error_message: Option<String>,
    pub recorded_at: String,
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub identifier_count: Option<u64>,
    pub repeat_page: Option<PageNumber>,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
