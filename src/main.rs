// src/main.rs
mod aggregate;
mod extractors;
mod render;
mod schema;
mod source;
mod storage;
mod utils;
mod workbook;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use aggregate::{Aggregator, FailurePolicy};
use schema::SchemaRegistry;
use source::CacheDirSource;
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the financial statement scanner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbols to scan
    #[arg(required = true)]
    symbols: Vec<String>,

    /// Directory holding cached filing workbooks (SYMBOL-YYYY-Q-10K.json)
    #[arg(long, default_value = "workspace/cache")]
    cache_dir: String,

    /// Output directory for statement tables and the HTML report
    #[arg(long, default_value = "workspace/result")]
    output_dir: String,

    /// Only scan filings from this year onward
    #[arg(long)]
    since: Option<u16>,

    /// Skip documents that fail to extract instead of aborting the run
    #[arg(long)]
    keep_going: bool,

    /// Number of documents to extract concurrently
    #[arg(long, default_value = "4")]
    jobs: usize,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    if args.jobs == 0 {
        return Err(AppError::Config("--jobs must be at least 1".to_string()));
    }

    // 3. Build the schema registry and shared services
    let registry = Arc::new(SchemaRegistry::builtin());
    let storage = StorageManager::new(&args.output_dir)?;
    let cache = Arc::new(CacheDirSource::new(&args.cache_dir));

    let policy = if args.keep_going {
        FailurePolicy::SkipDocument
    } else {
        FailurePolicy::Abort
    };
    let aggregator = Aggregator::new(Arc::clone(&registry), policy);

    // 4. Aggregate each symbol's cached filings
    let mut reports = Vec::new();
    let mut success_count = 0;
    let mut failure_count = 0;

    for symbol in &args.symbols {
        let symbol = symbol.to_uppercase();
        tracing::info!("Scanning cached filings for symbol: {}", symbol);

        let documents = cache.list_documents(&symbol, args.since)?;
        if documents.is_empty() {
            tracing::warn!("No cached filings found for {}, skipping symbol", symbol);
            continue;
        }
        tracing::info!("Found {} filings for {}", documents.len(), symbol);

        let report = aggregator
            .aggregate_concurrent(cache.clone(), &documents, args.jobs)
            .await?;

        let extracted = report
            .tables
            .values()
            .next()
            .map(|table| table.columns().len())
            .unwrap_or(0);
        success_count += extracted;
        failure_count += report.skipped.len();
        tracing::info!(
            "Extracted {} of {} filings for {}",
            extracted,
            documents.len(),
            symbol
        );

        match storage.save_tables(&symbol, &report) {
            Ok(path) => tracing::info!("Saved statement tables to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save statement tables: {}", e),
        }

        reports.push((symbol, report));
    }

    // 5. Render the combined report and run metadata
    if !reports.is_empty() {
        let path = render::write_index(Path::new(&args.output_dir), &reports)?;
        tracing::info!("Rendered report to: {}", path.display());

        let symbols: Vec<String> = reports.iter().map(|(symbol, _)| symbol.clone()).collect();
        storage.save_run_metadata(&symbols)?;
    }

    tracing::info!(
        "Processing finished. Success: {}, Failures: {}",
        success_count,
        failure_count
    );

    if success_count == 0 {
        return Err(AppError::Processing(format!(
            "No filings extracted for symbols: {}",
            args.symbols.join(", ")
        )));
    }

    Ok(())
}
