use serde::Deserialize;

/// Reads the product impressions the storefront keeps in page memory
pub const DEFAULT_EXTRACTION_SCRIPT: &str = r#"(() => {
    if (!window.staticImpressions) return null;
    return window.staticImpressions['category.products.list'] || null;
})()"#;

/// Field of each extracted record that carries the identifier
pub const DEFAULT_IDENTIFIER_FIELD: &str = "id";

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

/// Paginated catalog configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// URL template with `{page}` and optional `{page_size}` placeholders
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Items requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Exclusive safety ceiling for queued page numbers
    #[serde(rename = "upper-bound", default = "default_upper_bound")]
    pub upper_bound: u32,
}

/// Rendering engine and worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// DevTools discovery endpoint of an already running browser
    #[serde(rename = "debug-endpoint", default = "default_debug_endpoint")]
    pub debug_endpoint: String,

    /// Number of concurrent rendering sessions
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Bound on a single navigation attempt (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Pause between navigation and extraction (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Pause before extracting the first page (milliseconds)
    #[serde(rename = "bootstrap-settle-ms", default = "default_bootstrap_settle")]
    pub bootstrap_settle_ms: u64,

    /// JavaScript expression evaluated in each rendered page
    #[serde(rename = "extraction-script", default = "default_extraction_script")]
    pub extraction_script: String,

    /// Field holding the identifier in each extracted record
    #[serde(rename = "identifier-field", default = "default_identifier_field")]
    pub identifier_field: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV snapshot, rewritten after every successful page
    #[serde(rename = "snapshot-path")]
    pub snapshot_path: String,

    /// Path to the SQLite run ledger
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

fn default_page_size() -> u32 {
    36
}

fn default_upper_bound() -> u32 {
    1000
}

fn default_debug_endpoint() -> String {
    "http://localhost:9222/json/version".to_string()
}

fn default_workers() -> u32 {
    12
}

fn default_navigation_timeout() -> u64 {
    60_000
}

fn default_settle_delay() -> u64 {
    300
}

fn default_bootstrap_settle() -> u64 {
    1000
}

fn default_extraction_script() -> String {
    DEFAULT_EXTRACTION_SCRIPT.to_string()
}

fn default_identifier_field() -> String {
    DEFAULT_IDENTIFIER_FIELD.to_string()
}
