//! CLI entry point for the market monitor ETL.
//!
//! `build` pulls every dataset in the catalog and writes the daily wide table;
//! `preview` fetches a single CSV and reports how it normalizes.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use market_monitor::{
    catalog::DatasetDescriptor,
    fetch::BasicClient,
    output::print_json,
    pipeline::{DEFAULT_CATALOG_PATH, DEFAULT_OUTPUT_PATH, RunConfig, process_dataset, run},
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "market_monitor")]
#[command(about = "Build a daily JSON table from Market Monitor CSV datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every catalog dataset and write the combined table
    Build {
        /// Catalog JSON listing the datasets to pull
        #[arg(short, long, env = "CATALOG_PATH", default_value = DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,

        /// Destination of the JSON table
        #[arg(short, long, env = "OUTPUT_PATH", default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,

        /// Optional CSV file to write per-dataset quality summaries to
        #[arg(long, env = "QUALITY_REPORT_PATH")]
        quality_report: Option<PathBuf>,

        /// Maximum number of datasets fetched at once
        #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = 1)]
        concurrency: usize,
    },
    /// Fetch one CSV and log how it normalizes
    Preview {
        /// URL or local path of the CSV
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Column name to report under
        #[arg(short, long, default_value = "preview")]
        name: String,

        /// Zero-based position of the date column
        #[arg(long, default_value_t = 0)]
        date_column: usize,

        /// Zero-based position of the value column
        #[arg(long, default_value_t = 1)]
        value_column: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _file_guard = init_logging();

    let cli = Cli::parse();

    match execute(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ETL failed → {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Colored stderr plus a JSON daily-rolling log file.
fn init_logging() -> WorkerGuard {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/market_monitor.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("market_monitor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    file_guard
}

async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Build {
            catalog,
            output,
            quality_report,
            concurrency,
        } => {
            let config = RunConfig {
                catalog_path: catalog,
                output_path: output,
                quality_report,
                concurrency,
            };
            let summary = run(&config).await?;

            let lossy = summary.quality.iter().filter(|q| q.has_losses()).count();
            info!(
                rows = summary.rows,
                columns = summary.columns,
                datasets = summary.quality.len(),
                datasets_with_losses = lossy,
                "Build complete"
            );
            println!("Wrote {}", summary.output_path.display());
        }
        Commands::Preview {
            source,
            name,
            date_column,
            value_column,
        } => {
            let client = BasicClient::new().context("initializing HTTP client failed")?;
            let ds = DatasetDescriptor {
                short_name: name,
                csv_url: source,
                date_column,
                value_column,
            };
            let normalized = process_dataset(&client, &ds).await?;
            print_json(&normalized.quality)?;
        }
    }

    Ok(())
}
