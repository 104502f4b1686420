// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::aggregate::{AggregateReport, StatementTable};
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Saves a symbol's aggregated statement tables as JSON.
    pub fn save_tables(
        &self,
        symbol: &str,
        report: &AggregateReport,
    ) -> Result<PathBuf, StorageError> {
        let mut statements = serde_json::Map::new();
        for (statement, table) in &report.tables {
            statements.insert(statement.as_str().to_string(), table_json(table));
        }

        let mut period_ends = serde_json::Map::new();
        for (document, period_end) in &report.period_ends {
            period_ends.insert(document.clone(), json!(period_end));
        }

        let payload = json!({
            "symbol": symbol,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "statements": statements,
            "period_ends": period_ends,
            "skipped": report
                .skipped
                .iter()
                .map(|err| err.to_string())
                .collect::<Vec<String>>(),
        });

        let payload_str = serde_json::to_string_pretty(&payload)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let file_path = self
            .base_dir
            .join(format!("{}_statements.json", symbol.to_uppercase()));
        fs::write(&file_path, payload_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved statement tables to {}", file_path.display());

        Ok(file_path)
    }

    /// Saves metadata about the run in JSON format
    pub fn save_run_metadata(&self, symbols: &[String]) -> Result<PathBuf, StorageError> {
        let metadata = json!({
            "symbols": symbols,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let file_path = self.base_dir.join("run_metadata.json");
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved run metadata to {}", file_path.display());

        Ok(file_path)
    }
}

fn table_json(table: &StatementTable) -> Value {
    let mut rows = Vec::new();
    for key in table.canonical_keys() {
        rows.push(row_json(table, key, "canonical"));
    }
    for key in table.residual_keys() {
        rows.push(row_json(table, key, "residual"));
    }
    json!({
        "columns": table.columns(),
        "rows": rows,
    })
}

fn row_json(table: &StatementTable, key: &str, kind: &str) -> Value {
    let values: serde_json::Map<String, Value> = table
        .columns()
        .iter()
        .filter_map(|document| {
            table
                .value(key, document)
                .map(|value| (document.clone(), json!(value)))
        })
        .collect();
    json!({
        "key": key,
        "kind": kind,
        "values": values,
    })
}
