//! SKU Harvester: concurrent collection of product identifiers from a paginated catalog
//!
//! This crate drives a pool of browser rendering sessions across the pages of a
//! catalog whose last page is not known in advance. The end of the catalog is
//! detected when a page serves the first page's content again, at which point
//! every worker stops and the per-page results are merged into a sorted,
//! deduplicated identifier list.

pub mod catalog;
pub mod config;
pub mod harvester;
pub mod output;
pub mod render;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Browser debug endpoint {endpoint} unavailable: {message}")]
    Discovery { endpoint: String, message: String },

    #[error("Browser error: {0}")]
    Browser(#[from] render::RenderError),

    #[error("Could not extract identifiers from the first page ({url})")]
    BaselineUnavailable { url: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Catalog URL template errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("URL template is missing the {{page}} placeholder: {0}")]
    MissingPagePlaceholder(String),

    #[error("Failed to parse catalog URL: {0}")]
    Parse(String),

    #[error("Invalid catalog URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Page numbers start at 1, got {0}")]
    InvalidPage(u32),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

// Re-export commonly used types
pub use catalog::CatalogUrl;
pub use config::Config;
pub use harvester::{HarvestReport, StopReason};
pub use state::{PageNumber, PageOutcome, PageStatus};
