//! End-to-end run: catalog → per-dataset series → wide table → JSON.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{Instrument, info, warn};

use crate::catalog::{Catalog, DatasetDescriptor};
use crate::error::{EtlError, Result};
use crate::fetch::{BasicClient, HttpClient, load_source};
use crate::output::{write_json, write_quality_csv};
use crate::parser::parse_rows;
use crate::rolling::{ROLLING_PREFIX, ROLLING_WINDOW, append_rolling_sums};
use crate::series::{NormalizedSeries, Series, normalize};
use crate::stats::SeriesQuality;
use crate::table::{WideTable, merge};

pub const DEFAULT_CATALOG_PATH: &str = "csv_catalog.json";
pub const DEFAULT_OUTPUT_PATH: &str = "docs/inventory.json";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub catalog_path: PathBuf,
    pub output_path: PathBuf,
    /// Optional CSV destination for per-dataset quality summaries.
    pub quality_report: Option<PathBuf>,
    /// Maximum number of datasets fetched at once.
    pub concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            quality_report: None,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub quality: Vec<SeriesQuality>,
}

/// Runs the whole pipeline with a real HTTP client.
pub async fn run(config: &RunConfig) -> Result<RunSummary> {
    let client = BasicClient::new().map_err(EtlError::HttpClient)?;
    run_with_client(config, Arc::new(client)).await
}

/// Runs the whole pipeline with the given client.
///
/// Nothing is written unless every dataset was fetched successfully.
#[tracing::instrument(skip(client), fields(catalog = %config.catalog_path.display()))]
pub async fn run_with_client<C: HttpClient + 'static>(
    config: &RunConfig,
    client: Arc<C>,
) -> Result<RunSummary> {
    let catalog = Catalog::load(&config.catalog_path)?;
    info!(datasets = catalog.len(), "Catalog loaded");

    let normalized = collect_series(client, catalog.datasets(), config.concurrency).await?;
    let (series, quality): (Vec<Series>, Vec<SeriesQuality>) = normalized
        .into_iter()
        .map(|n| (n.series, n.quality))
        .unzip();

    let table = build_table(&series);
    info!(rows = table.len(), columns = table.columns().len(), "Wide table built");

    write_json(&config.output_path, &table)?;
    if let Some(path) = &config.quality_report {
        write_quality_csv(path, &quality)?;
    }

    Ok(RunSummary {
        output_path: config.output_path.clone(),
        rows: table.len(),
        columns: table.columns().len(),
        quality,
    })
}

/// Merges the series onto a daily grid and appends the rolling columns.
pub fn build_table(series: &[Series]) -> WideTable {
    let mut table = merge(series);
    let added = append_rolling_sums(&mut table, ROLLING_PREFIX, ROLLING_WINDOW);
    if added > 0 {
        info!(added, window = ROLLING_WINDOW, "Rolling sum columns added");
    }
    table
}

/// Fetches and normalizes every dataset, at most `concurrency` at a time.
///
/// With a concurrency of 1 datasets are processed strictly one after another
/// in catalog order and nothing past the first failure is fetched. Otherwise
/// tasks start in catalog order as permits free up. Results always come back
/// in catalog order and the first failure, in catalog order, aborts the
/// outstanding tasks and is returned.
pub async fn collect_series<C: HttpClient + 'static>(
    client: Arc<C>,
    datasets: &[DatasetDescriptor],
    concurrency: usize,
) -> Result<Vec<NormalizedSeries>> {
    if concurrency <= 1 {
        let mut results = Vec::with_capacity(datasets.len());
        for ds in datasets {
            let span = tracing::info_span!("process_dataset", dataset = %ds.short_name);
            results.push(process_dataset(client.as_ref(), ds).instrument(span).await?);
        }
        return Ok(results);
    }

    let semaphore = Arc::new(Semaphore::new(concurrency));

    let mut tasks = Vec::with_capacity(datasets.len());
    for ds in datasets {
        // taken before spawning so tasks start in catalog order; never closed
        let permit = semaphore.clone().acquire_owned().await.ok();
        let client = client.clone();
        let ds = ds.clone();

        let span = tracing::info_span!("process_dataset", dataset = %ds.short_name);
        tasks.push(tokio::spawn(
            async move {
                let result = process_dataset(client.as_ref(), &ds).await;
                drop(permit);
                result
            }
            .instrument(span),
        ));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for i in 0..tasks.len() {
        let outcome = match (&mut tasks[i]).await {
            Ok(result) => result,
            Err(e) => Err(EtlError::Worker(e)),
        };
        match outcome {
            Ok(normalized) => results.push(normalized),
            Err(e) => {
                for task in &tasks[i + 1..] {
                    task.abort();
                }
                return Err(e);
            }
        }
    }

    Ok(results)
}

/// Fetch → parse → normalize for a single dataset.
pub async fn process_dataset<C: HttpClient>(
    client: &C,
    ds: &DatasetDescriptor,
) -> Result<NormalizedSeries> {
    info!(url = %ds.csv_url, "Fetching dataset");
    let text = load_source(client, &ds.csv_url)
        .await
        .map_err(|source| EtlError::Fetch {
            short_name: ds.short_name.clone(),
            url: ds.csv_url.clone(),
            source,
        })?;

    let raw = parse_rows(&text, ds.date_column, ds.value_column);
    let normalized = normalize(&raw, &ds.short_name);

    let q = &normalized.quality;
    if q.has_losses() {
        warn!(
            rows_read = q.rows_read,
            header_rows = q.header_rows,
            malformed_rows = q.malformed_rows,
            invalid_dates = q.invalid_dates,
            invalid_values = q.invalid_values,
            duplicate_dates = q.duplicate_dates,
            "Rows discarded while normalizing"
        );
    }
    if normalized.series.is_empty() {
        warn!(columns = raw.column_count, "Dataset produced no observations");
    } else {
        info!(
            observations = q.observations,
            first_date = ?q.first_date,
            last_date = ?q.last_date,
            "Dataset normalized"
        );
    }

    Ok(normalized)
}
