//! End-to-end harvest runs against scripted catalogs

use sku_harvester::config::{
    BrowserConfig, CatalogConfig, Config, OutputConfig, DEFAULT_EXTRACTION_SCRIPT,
    DEFAULT_IDENTIFIER_FIELD,
};
use sku_harvester::harvester::Coordinator;
use sku_harvester::output::{read_snapshot, CsvSnapshotWriter};
use sku_harvester::render::{ScriptedBackend, ScriptedPage};
use sku_harvester::storage::{RunStatus, SqliteStorage, Storage};
use sku_harvester::{CatalogUrl, HarvestError, PageStatus, StopReason};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const TEMPLATE: &str = "https://shop.example.com/in-stock?p={page}&product_list_limit={page_size}";

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &Path, workers: u32, upper_bound: u32) -> Config {
    Config {
        catalog: CatalogConfig {
            url_template: TEMPLATE.to_string(),
            page_size: 36,
            upper_bound,
        },
        browser: BrowserConfig {
            debug_endpoint: "http://localhost:9222/json/version".to_string(),
            workers,
            navigation_timeout_ms: 1000,
            settle_delay_ms: 0,
            bootstrap_settle_ms: 0,
            extraction_script: DEFAULT_EXTRACTION_SCRIPT.to_string(),
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
        },
        output: OutputConfig {
            snapshot_path: snapshot_path(dir).display().to_string(),
            database_path: dir.join("harvest.db").display().to_string(),
            summary_path: Some(dir.join("summary.md").display().to_string()),
        },
    }
}

fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join("skus.csv")
}

/// Builds a scripted catalog from `(page, behaviour)` pairs
fn scripted_catalog(pages: Vec<(u32, ScriptedPage)>) -> ScriptedBackend {
    let catalog = CatalogUrl::new(TEMPLATE, 36).expect("valid template");
    pages
        .into_iter()
        .fold(ScriptedBackend::new(), |backend, (page, behaviour)| {
            backend.page(&catalog.page_url(page).expect("valid page"), behaviour)
        })
        .with_latency(Duration::from_millis(5))
}

fn coordinator(config: Config, backend: ScriptedBackend) -> Coordinator<ScriptedBackend> {
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let writer = CsvSnapshotWriter::new(&config.output.snapshot_path);
    Coordinator::new(config, backend, storage, Box::new(writer), "test-hash")
        .expect("Failed to create coordinator")
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_repeat_page_ends_catalog() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut pages = vec![
        (1, ScriptedPage::items(&["A1", "A2"])),
        (2, ScriptedPage::items(&["A3", "A4"])),
    ];
    // Past the real end the site serves page 1 again
    for page in 3..20 {
        pages.push((page, ScriptedPage::items(&["A1", "A5"])));
    }

    let config = create_test_config(dir.path(), 3, 20);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.identifiers, ids(&["A1", "A2", "A3", "A4"]));
    assert_eq!(report.repeat_page, Some(3));
    assert_eq!(report.stop_reason, StopReason::RepeatDetected);

    // Final output is persisted, and the page-3 extra identifier is excluded
    let saved = read_snapshot(&snapshot_path(dir.path())).expect("Failed to read snapshot");
    assert_eq!(saved, ids(&["A1", "A2", "A3", "A4"]));

    // The pool stopped long before the ceiling
    let visited = coordinator.backend().visited_urls();
    assert!(visited.len() < 19, "Expected early stop, visited {}", visited.len());
}

#[tokio::test]
async fn test_ceiling_reached_without_repeat() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![
        (1, ScriptedPage::items(&["P1a", "P1b"])),
        (2, ScriptedPage::items(&["P2a"])),
        (3, ScriptedPage::items(&["P3a", "P1b"])),
        (4, ScriptedPage::items(&["P4a"])),
        (5, ScriptedPage::items(&["P5a"])),
    ];

    let config = create_test_config(dir.path(), 2, 6);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.stop_reason, StopReason::QueueExhausted);
    assert_eq!(report.repeat_page, None);
    assert_eq!(
        report.identifiers,
        ids(&["P1a", "P1b", "P2a", "P3a", "P4a", "P5a"])
    );
    assert_eq!(report.pages_recorded, 5);
}

#[tokio::test]
async fn test_unreachable_page_does_not_abort_run() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![
        (1, ScriptedPage::items(&["A1", "A2"])),
        (2, ScriptedPage::items(&["A3"])),
        (3, ScriptedPage::items(&["A4"])),
        (4, ScriptedPage::items(&["A5"])),
        (5, ScriptedPage::Unreachable),
        (6, ScriptedPage::items(&["A7"])),
        (7, ScriptedPage::items(&["A1", "A2"])),
    ];

    let config = create_test_config(dir.path(), 2, 8);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.identifiers, ids(&["A1", "A2", "A3", "A4", "A5", "A7"]));
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.repeat_page, Some(7));

    // The ledger keeps the failure apart from an empty page
    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    let records = storage
        .get_page_records(report.run_id)
        .expect("Failed to read ledger");
    let page_five = records
        .iter()
        .find(|r| r.page_number == 5)
        .expect("page 5 recorded");
    assert_eq!(page_five.status, PageStatus::Failed);
    assert!(page_five.error_message.is_some());

    // Both readiness modes were tried for the unreachable page
    let attempts = coordinator
        .backend()
        .navigations()
        .into_iter()
        .filter(|(url, _)| url.contains("p=5&"))
        .count();
    assert_eq!(attempts, 2);
}

#[tokio::test]
async fn test_slow_page_loads_on_relaxed_retry() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![
        (1, ScriptedPage::items(&["A1"])),
        (2, ScriptedPage::Slow(ids(&["S1", "S2"]))),
        (3, ScriptedPage::items(&["A1"])),
    ];

    let config = create_test_config(dir.path(), 1, 10);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let report = coordinator.run().await.expect("Harvest failed");

    assert_eq!(report.identifiers, ids(&["A1", "S1", "S2"]));
    assert_eq!(report.pages_failed, 0);
}

#[tokio::test]
async fn test_no_page_is_processed_twice() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut pages = Vec::new();
    for page in 1..40 {
        let a = format!("I{}a", page);
        let b = format!("I{}b", page);
        pages.push((page, ScriptedPage::items(&[a.as_str(), b.as_str()])));
    }

    let config = create_test_config(dir.path(), 8, 40);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let report = coordinator.run().await.expect("Harvest failed");
    assert_eq!(report.identifiers.len(), 78);

    let visited = coordinator.backend().visited_urls();
    let unique: HashSet<_> = visited.iter().collect();
    assert_eq!(visited.len(), 39);
    assert_eq!(unique.len(), visited.len(), "A page was fetched twice");
}

#[tokio::test]
async fn test_every_session_is_closed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![
        (1, ScriptedPage::items(&["A1"])),
        (2, ScriptedPage::items(&["A2"])),
        (3, ScriptedPage::items(&["A1"])),
    ];

    let config = create_test_config(dir.path(), 4, 100);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    coordinator.run().await.expect("Harvest failed");

    // Bootstrap session plus one per worker
    assert_eq!(coordinator.backend().sessions_opened(), 5);
    assert_eq!(coordinator.backend().sessions_closed(), 5);
}

#[tokio::test]
async fn test_empty_first_page_is_fatal() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![(2, ScriptedPage::items(&["A2"]))];

    let config = create_test_config(dir.path(), 3, 10);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let result = coordinator.run().await;
    assert!(matches!(
        result,
        Err(HarvestError::BaselineUnavailable { .. })
    ));

    // Only the bootstrap session was opened and no worker ran
    assert_eq!(coordinator.backend().sessions_opened(), 1);
    assert_eq!(coordinator.backend().sessions_closed(), 1);
    assert_eq!(coordinator.backend().visited_urls().len(), 1);

    let storage = coordinator.storage();
    let run = storage
        .lock()
        .unwrap()
        .get_latest_run()
        .expect("Failed to query runs")
        .expect("run recorded");
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_refused_sessions_abort_run() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let backend = ScriptedBackend::new().refusing_sessions();

    let config = create_test_config(dir.path(), 2, 10);
    let mut coordinator = coordinator(config, backend);

    let result = coordinator.run().await;
    assert!(matches!(result, Err(HarvestError::Browser(_))));
}

#[tokio::test]
async fn test_invalid_config_rejected_before_run() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![(1, ScriptedPage::items(&["A1"]))];

    let config = create_test_config(dir.path(), 0, 10);
    let storage = SqliteStorage::new_in_memory().expect("Failed to create storage");
    let writer = CsvSnapshotWriter::new(&config.output.snapshot_path);

    let result = Coordinator::new(
        config,
        scripted_catalog(pages),
        storage,
        Box::new(writer),
        "test-hash",
    );

    assert!(matches!(result, Err(HarvestError::Config(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeat_detection_on_multi_thread_runtime() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut pages = Vec::new();
    for page in 1..30 {
        let id = format!("M{:02}", page);
        pages.push((page, ScriptedPage::items(&[id.as_str()])));
    }
    for page in 30..60 {
        pages.push((page, ScriptedPage::items(&["M01"])));
    }

    let config = create_test_config(dir.path(), 8, 60);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let report = tokio::time::timeout(Duration::from_secs(30), coordinator.run())
        .await
        .expect("Harvest did not finish")
        .expect("Harvest failed");

    let expected: Vec<String> = (1..30).map(|page| format!("M{:02}", page)).collect();
    assert_eq!(report.identifiers, expected);
    assert_eq!(report.repeat_page, Some(30));
    assert_eq!(report.stop_reason, StopReason::RepeatDetected);

    let visited = coordinator.backend().visited_urls();
    let unique: HashSet<_> = visited.iter().collect();
    assert_eq!(unique.len(), visited.len(), "A page was fetched twice");
}

#[tokio::test]
async fn test_run_is_recorded_and_summarised() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![
        (1, ScriptedPage::items(&["A1", "A2"])),
        (2, ScriptedPage::items(&["A3", "A4"])),
        (3, ScriptedPage::items(&["A1", "A5"])),
    ];

    let config = create_test_config(dir.path(), 1, 10);
    let mut coordinator = coordinator(config, scripted_catalog(pages));

    let report = coordinator.run().await.expect("Harvest failed");

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    let run = storage.get_run(report.run_id).expect("run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.identifier_count, Some(4));
    assert_eq!(run.repeat_page, Some(3));
    assert_eq!(
        storage
            .count_pages_by_status(report.run_id, PageStatus::Repeat)
            .expect("Failed to count pages"),
        1
    );

    let summary = std::fs::read_to_string(dir.path().join("summary.md"))
        .expect("summary written");
    assert!(summary.contains("page 3 repeated page 1"));
}

#[tokio::test]
async fn test_file_backed_ledger_accumulates_runs() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pages = vec![
        (1, ScriptedPage::items(&["A1"])),
        (2, ScriptedPage::items(&["A1"])),
    ];

    for expected_run in 1..=2 {
        let config = create_test_config(dir.path(), 1, 5);
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))
            .expect("Failed to open database");
        let writer = CsvSnapshotWriter::new(&config.output.snapshot_path);
        let mut coordinator = Coordinator::new(
            config,
            scripted_catalog(pages.clone()),
            storage,
            Box::new(writer),
            "hash",
        )
        .expect("Failed to create coordinator");

        let report = coordinator.run().await.expect("Harvest failed");
        assert_eq!(report.run_id, expected_run);
        assert_eq!(report.identifiers, ids(&["A1"]));
    }
}
