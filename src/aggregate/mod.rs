// src/aggregate/mod.rs
//
// Merges per-document extraction records into per-statement-type tables:
// canonical rows fixed by the schema in declared order, residual rows grown in
// first-seen order across documents, one column per document in input order.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::Semaphore;

use crate::extractors::classifier::ExtractionRecord;
use crate::extractors::document::{DocumentExtractor, DocumentRecords};
use crate::schema::{SchemaRegistry, StatementSpec, StatementType};
use crate::source::{DocumentRef, DocumentSource};
use crate::utils::error::{AppError, DocumentError, ExtractError};

/// What to do when a single document's extraction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the whole batch on the first bad document.
    Abort,
    /// Report the bad document and keep going; it contributes no column.
    SkipDocument,
}

/// One statement type's cross-document table.
#[derive(Debug, Clone)]
pub struct StatementTable {
    statement: StatementType,
    columns: Vec<String>,
    canonical: IndexMap<String, HashMap<String, f64>>,
    residual: IndexMap<String, HashMap<String, f64>>,
}

impl StatementTable {
    fn new(spec: &StatementSpec) -> Self {
        // Canonical rows are pre-seeded from the schema so row ordering is
        // stable across runs regardless of which documents are present.
        let canonical = spec
            .canonical_keys()
            .map(|key| (key.to_string(), HashMap::new()))
            .collect();
        Self {
            statement: spec.statement(),
            columns: Vec::new(),
            canonical,
            residual: IndexMap::new(),
        }
    }

    /// Column keys: documents in input order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Canonical row keys in the schema's declared order.
    pub fn canonical_keys(&self) -> impl Iterator<Item = &str> {
        self.canonical.keys().map(String::as_str)
    }

    /// Residual row keys in first-seen order.
    pub fn residual_keys(&self) -> impl Iterator<Item = &str> {
        self.residual.keys().map(String::as_str)
    }

    /// Cell lookup; None is an absent cell.
    pub fn value(&self, key: &str, document: &str) -> Option<f64> {
        self.canonical
            .get(key)
            .or_else(|| self.residual.get(key))
            .and_then(|cells| cells.get(document))
            .copied()
    }

    fn push_column(
        &mut self,
        document: &str,
        record: &ExtractionRecord,
    ) -> Result<(), ExtractError> {
        if !self.columns.iter().any(|c| c == document) {
            self.columns.push(document.to_string());
        }
        for (key, line) in record.canonical() {
            let cells = self.canonical.entry(key.to_string()).or_default();
            Self::set_cell(self.statement, cells, key, document, line.value)?;
        }
        for (key, value) in record.residual() {
            let cells = self.residual.entry(key.to_string()).or_default();
            Self::set_cell(self.statement, cells, key, document, value)?;
        }
        Ok(())
    }

    // A cell is set at most once: re-deriving an equal value is a no-op,
    // a different value is a batch-integrity failure.
    fn set_cell(
        statement: StatementType,
        cells: &mut HashMap<String, f64>,
        key: &str,
        document: &str,
        value: f64,
    ) -> Result<(), ExtractError> {
        match cells.get(document) {
            Some(existing) if *existing == value => Ok(()),
            Some(existing) => Err(ExtractError::ConflictingValue {
                statement,
                key: key.to_string(),
                existing: *existing,
                new: value,
            }),
            None => {
                cells.insert(document.to_string(), value);
                Ok(())
            }
        }
    }
}

/// The output of one aggregation run.
#[derive(Debug)]
pub struct AggregateReport {
    pub tables: IndexMap<StatementType, StatementTable>,
    /// Period end date per document id, when the filing declared one.
    pub period_ends: IndexMap<String, Option<String>>,
    /// Documents dropped under `FailurePolicy::SkipDocument`.
    pub skipped: Vec<DocumentError>,
}

impl AggregateReport {
    fn new(registry: &SchemaRegistry) -> Self {
        let tables = registry
            .specs()
            .iter()
            .map(|spec| (spec.statement(), StatementTable::new(spec)))
            .collect();
        Self {
            tables,
            period_ends: IndexMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Folds one document's records into every statement table.
    pub fn fold(
        &mut self,
        document: &DocumentRef,
        records: &DocumentRecords,
    ) -> Result<(), DocumentError> {
        for (statement, table) in self.tables.iter_mut() {
            let Some(record) = records.record(*statement) else {
                continue;
            };
            table
                .push_column(&document.id, record)
                .map_err(|e| DocumentError::new(&document.id, e))?;
        }
        self.period_ends
            .insert(document.id.clone(), records.period_end.clone());
        Ok(())
    }
}

/// Drives the Document Extractor over a batch of documents.
pub struct Aggregator {
    registry: Arc<SchemaRegistry>,
    policy: FailurePolicy,
}

impl Aggregator {
    pub fn new(registry: Arc<SchemaRegistry>, policy: FailurePolicy) -> Self {
        Self { registry, policy }
    }

    /// Sequential aggregation in input order.
    pub fn aggregate(
        &self,
        source: &dyn DocumentSource,
        documents: &[DocumentRef],
    ) -> Result<AggregateReport, DocumentError> {
        let mut report = AggregateReport::new(&self.registry);
        let extractor = DocumentExtractor::new(&self.registry);
        for document in documents {
            tracing::info!("processing document '{}'", document.id);
            match extractor.extract(source, document) {
                Ok(records) => report.fold(document, &records)?,
                Err(err) => self.handle_failure(&mut report, err)?,
            }
        }
        Ok(report)
    }

    /// Concurrent aggregation on a bounded worker pool. Documents extract in
    /// parallel (they share nothing mutable), but results fold in input order,
    /// so the tables are identical to the sequential run.
    pub async fn aggregate_concurrent(
        &self,
        source: Arc<dyn DocumentSource>,
        documents: &[DocumentRef],
        jobs: usize,
    ) -> Result<AggregateReport, AppError> {
        let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
        let mut handles = Vec::with_capacity(documents.len());
        for document in documents {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| AppError::Processing("extraction semaphore closed".to_string()))?;
            let source = Arc::clone(&source);
            let registry = Arc::clone(&self.registry);
            let document = document.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                tracing::info!("processing document '{}'", document.id);
                DocumentExtractor::new(&registry).extract(source.as_ref(), &document)
            }));
        }

        let mut report = AggregateReport::new(&self.registry);
        for (document, handle) in documents.iter().zip(handles) {
            let outcome = handle.await.map_err(|e| {
                AppError::Processing(format!(
                    "extraction task for '{}' failed: {e}",
                    document.id
                ))
            })?;
            match outcome {
                Ok(records) => report.fold(document, &records)?,
                Err(err) => self.handle_failure(&mut report, err)?,
            }
        }
        Ok(report)
    }

    fn handle_failure(
        &self,
        report: &mut AggregateReport,
        err: DocumentError,
    ) -> Result<(), DocumentError> {
        match self.policy {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::SkipDocument => {
                tracing::error!("skipping {err}");
                report.skipped.push(err);
                Ok(())
            }
        }
    }
}
