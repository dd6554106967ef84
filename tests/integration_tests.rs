use std::fs;
use std::path::{Path, PathBuf};

use market_monitor::error::EtlError;
use market_monitor::pipeline::{RunConfig, run};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Fresh scratch directory holding a catalog with the given `(short_name, source)` pairs.
fn workspace(test: &str, datasets: &[(&str, String)]) -> (PathBuf, RunConfig) {
    let dir = std::env::temp_dir().join(format!("market_monitor_it_{test}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    let entries: Vec<_> = datasets
        .iter()
        .map(|(name, url)| serde_json::json!({ "short_name": name, "csv_url": url }))
        .collect();
    let catalog_path = dir.join("csv_catalog.json");
    fs::write(
        &catalog_path,
        serde_json::json!({ "datasets": entries }).to_string(),
    )
    .unwrap();

    let config = RunConfig {
        catalog_path,
        output_path: dir.join("docs").join("inventory.json"),
        quality_report: Some(dir.join("quality.csv")),
        concurrency: 1,
    };
    (dir, config)
}

fn read_rows(path: &Path) -> Vec<serde_json::Value> {
    let content = fs::read_to_string(path).unwrap();
    serde_json::from_str::<serde_json::Value>(&content)
        .unwrap()
        .as_array()
        .unwrap()
        .clone()
}

#[tokio::test]
async fn test_full_pipeline_two_datasets() {
    let (dir, config) = workspace(
        "full",
        &[
            ("newlistings_x", fixture("newlistings_x.csv")),
            ("price_y", fixture("price_y.csv")),
        ],
    );

    let summary = run(&config).await.expect("pipeline failed");
    assert_eq!(summary.rows, 10);
    assert_eq!(summary.columns, 3);

    let content = fs::read_to_string(&config.output_path).unwrap();
    assert!(content.starts_with(
        r#"[{"date":"2024-03-01","newlistings_x":1.0,"price_y":100.0,"newlistings_x_7d":null}"#
    ));

    let rows = read_rows(&config.output_path);
    assert_eq!(rows.len(), 10);
    for row in &rows[..6] {
        assert!(row["newlistings_x_7d"].is_null());
    }
    let sums: Vec<_> = rows[6..]
        .iter()
        .map(|r| r["newlistings_x_7d"].as_f64().unwrap())
        .collect();
    assert_eq!(sums, [28.0, 35.0, 42.0, 49.0]);

    let prices: Vec<_> = rows.iter().map(|r| r["price_y"].as_f64().unwrap()).collect();
    let expected: Vec<_> = (100..110).map(f64::from).collect();
    assert_eq!(prices, expected);
    assert_eq!(rows[9]["date"], "2024-03-10");

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_pipeline_is_idempotent() {
    let (dir, config) = workspace(
        "idempotent",
        &[
            ("newlistings_x", fixture("newlistings_x.csv")),
            ("inventory_z", fixture("inventory_gaps.csv")),
        ],
    );

    run(&config).await.unwrap();
    let first = fs::read(&config.output_path).unwrap();
    run(&config).await.unwrap();
    let second = fs::read(&config.output_path).unwrap();

    assert_eq!(first, second);
    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_concurrent_fetch_matches_sequential() {
    let datasets = [
        ("price_y", fixture("price_y.csv")),
        ("inventory_z", fixture("inventory_gaps.csv")),
        ("newlistings_x", fixture("newlistings_x.csv")),
    ];
    let (dir_a, sequential) = workspace("sequential", &datasets);
    let (dir_b, mut parallel) = workspace("parallel", &datasets);
    parallel.concurrency = 4;

    run(&sequential).await.unwrap();
    run(&parallel).await.unwrap();

    assert_eq!(
        fs::read(&sequential.output_path).unwrap(),
        fs::read(&parallel.output_path).unwrap()
    );

    fs::remove_dir_all(&dir_a).unwrap();
    fs::remove_dir_all(&dir_b).unwrap();
}

#[tokio::test]
async fn test_gaps_are_forward_filled_and_losses_reported() {
    let (dir, config) = workspace("gaps", &[("inventory_z", fixture("inventory_gaps.csv"))]);

    let summary = run(&config).await.unwrap();

    let rows = read_rows(&config.output_path);
    let values: Vec<_> = rows
        .iter()
        .map(|r| r["inventory_z"].as_f64().unwrap())
        .collect();
    assert_eq!(values, [1200.0, 1200.0, 1350.0, 1350.0, 1350.0, 1400.0]);

    let q = &summary.quality[0];
    assert_eq!(q.rows_read, 6);
    assert_eq!(q.header_rows, 1);
    assert_eq!(q.malformed_rows, 1);
    assert_eq!(q.invalid_dates, 0);
    assert_eq!(q.invalid_values, 1);
    assert_eq!(q.observations, 3);
    assert!(q.has_losses());

    let report = fs::read_to_string(config.quality_report.as_ref().unwrap()).unwrap();
    assert_eq!(report.lines().count(), 2);
    assert!(report.lines().nth(1).unwrap().starts_with("inventory_z,6,1,1,0,1,0,3,"));

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_failed_fetch_aborts_without_output() {
    let (dir, config) = workspace(
        "fetch_failure",
        &[
            ("newlistings_x", fixture("newlistings_x.csv")),
            ("missing", fixture("does_not_exist.csv")),
        ],
    );

    let err = run(&config).await.unwrap_err();

    match err {
        EtlError::Fetch { short_name, .. } => assert_eq!(short_name, "missing"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.output_path.exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_missing_catalog_is_fatal() {
    let config = RunConfig {
        catalog_path: PathBuf::from("/no/such/dir/csv_catalog.json"),
        output_path: std::env::temp_dir().join("market_monitor_it_no_catalog.json"),
        quality_report: None,
        concurrency: 1,
    };

    let err = run(&config).await.unwrap_err();
    assert!(matches!(err, EtlError::Catalog { .. }));
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_colliding_column_names_abort_before_output() {
    let (dir, config) = workspace(
        "collision",
        &[
            ("newlistings_x", fixture("newlistings_x.csv")),
            ("newlistings_x_7d", fixture("price_y.csv")),
        ],
    );

    let err = run(&config).await.unwrap_err();

    assert!(matches!(err, EtlError::Catalog { .. }));
    assert!(!config.output_path.exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_empty_catalog_writes_empty_array() {
    let (dir, config) = workspace("empty", &[]);

    let summary = run(&config).await.unwrap();

    assert_eq!(summary.rows, 0);
    assert_eq!(fs::read_to_string(&config.output_path).unwrap(), "[]");
    fs::remove_dir_all(&dir).unwrap();
}
