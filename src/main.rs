//! SKU Harvester main entry point
//!
//! This is the command-line interface for the catalog identifier harvester.

use clap::Parser;
use std::path::{Path, PathBuf};
use sku_harvester::config::{load_config_with_hash, Config};
use sku_harvester::harvester::run_harvest;
use sku_harvester::CatalogUrl;
use tracing_subscriber::EnvFilter;

/// SKU Harvester: collects product identifiers from a paginated catalog
///
/// The harvester drives a pool of tabs in an already running Chromium
/// instance across the catalog's pages, stops once a page serves page 1's
/// content again, and writes the sorted, deduplicated identifiers to CSV.
#[derive(Parser, Debug)]
#[command(name = "sku-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Concurrent product identifier harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the harvest plan without contacting the browser
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_harvest(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sku_harvester=info,warn"),
            1 => EnvFilter::new("sku_harvester=debug,info"),
            2 => EnvFilter::new("sku_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the harvest plan
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== SKU Harvester Dry Run ===\n");

    let catalog = CatalogUrl::new(&config.catalog.url_template, config.catalog.page_size)?;

    println!("Catalog:");
    println!("  Template: {}", catalog.template());
    println!("  Page size: {}", catalog.page_size());
    println!("  Page ceiling: {} (exclusive)", config.catalog.upper_bound);
    println!("  First pages:");
    for page in 1..config.catalog.upper_bound.min(4) {
        println!("    {}: {}", page, catalog.page_url(page)?);
    }

    println!("\nBrowser:");
    println!("  Debug endpoint: {}", config.browser.debug_endpoint);
    println!("  Workers: {}", config.browser.workers);
    println!(
        "  Navigation timeout: {}ms",
        config.browser.navigation_timeout_ms
    );
    println!("  Settle delay: {}ms", config.browser.settle_delay_ms);
    println!("  Bootstrap settle: {}ms", config.browser.bootstrap_settle_ms);
    println!("  Identifier field: {}", config.browser.identifier_field);

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.snapshot_path);
    println!("  Database: {}", config.output.database_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest up to {} pages with {} workers",
        config.catalog.upper_bound - 1,
        config.browser.workers
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use sku_harvester::output::{load_statistics, print_statistics};
    use sku_harvester::storage::SqliteStorage;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use sku_harvester::output::{generate_markdown_summary, generate_summary};
    use sku_harvester::storage::SqliteStorage;

    let Some(summary_path) = &config.output.summary_path else {
        return Err("output.summary-path is not set in the configuration".into());
    };

    println!("=== Exporting Harvest Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", summary_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    tracing::info!("Loading run data from database...");
    let summary = generate_summary(&storage)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(summary_path))?;

    println!("✓ Summary exported to: {}", summary_path);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    config_hash: String,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Harvesting {} with {} workers (page ceiling {})",
        config.catalog.url_template,
        config.browser.workers,
        config.catalog.upper_bound
    );
    let snapshot_path = config.output.snapshot_path.clone();

    match run_harvest(config, config_hash).await {
        Ok(report) => {
            tracing::info!(
                "Harvest completed: {} ({} pages, {} failed, {} empty)",
                report.stop_reason,
                report.pages_recorded,
                report.pages_failed,
                report.pages_empty
            );
            println!("Total unique SKUs: {}", report.identifiers.len());
            println!("Saved to: {}", snapshot_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
