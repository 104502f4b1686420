// src/extractors/document.rs
//
// Owns the extraction of one input document: opens it as a workbook, resolves
// and classifies every registered statement type, and recovers the filing's
// period end date. A document missing any statement sheet fails as a whole; a
// filing without its balance sheet is not independently usable.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::extractors::classifier::{classify, ExtractionRecord};
use crate::extractors::locator;
use crate::schema::{MatchRule, SchemaRegistry, StatementType};
use crate::source::{DocumentRef, DocumentSource};
use crate::utils::error::DocumentError;
use crate::workbook::{Cell, Workbook};

static DEI_SHEET_RULE: Lazy<MatchRule> =
    Lazy::new(|| MatchRule::new("document and entity information", None));
static PERIOD_END_RULE: Lazy<MatchRule> =
    Lazy::new(|| MatchRule::new("document period end date", None));

/// One document's extraction results, keyed by statement type.
#[derive(Debug, Clone)]
pub struct DocumentRecords {
    pub period_end: Option<String>,
    pub records: IndexMap<StatementType, ExtractionRecord>,
}

impl DocumentRecords {
    pub fn record(&self, statement: StatementType) -> Option<&ExtractionRecord> {
        self.records.get(&statement)
    }
}

pub struct DocumentExtractor<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> DocumentExtractor<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Extracts every registered statement type from one document.
    pub fn extract(
        &self,
        source: &dyn DocumentSource,
        document: &DocumentRef,
    ) -> Result<DocumentRecords, DocumentError> {
        let workbook = source
            .open(document)
            .map_err(|e| DocumentError::new(&document.id, e))?;

        let period_end = period_end_date(&workbook);
        tracing::debug!(
            "document '{}': period end date {:?}",
            document.id,
            period_end
        );

        let mut records = IndexMap::new();
        for spec in self.registry.specs() {
            let resolved = locator::locate(&workbook, spec)
                .map_err(|e| DocumentError::new(&document.id, e))?;
            tracing::debug!(
                "document '{}': {} sheet is '{}'",
                document.id,
                spec.statement(),
                resolved.full_name
            );
            let record =
                classify(&resolved).map_err(|e| DocumentError::new(&document.id, e))?;
            records.insert(spec.statement(), record);
        }

        Ok(DocumentRecords {
            period_end,
            records,
        })
    }
}

/// Best-effort recovery of the filing's period end date from the "Document and
/// Entity Information" sheet. Filings without that sheet or row yield None.
fn period_end_date(workbook: &Workbook) -> Option<String> {
    let sheet = workbook.sheets.iter().find(|sheet| {
        sheet
            .full_name()
            .is_some_and(|name| DEI_SHEET_RULE.matches(&name.to_lowercase()))
    })?;

    for row in sheet.data_rows() {
        let Some(label) = row.first().and_then(Cell::as_text) else {
            continue;
        };
        if PERIOD_END_RULE.matches(&label.to_lowercase()) {
            return row
                .get(1)
                .and_then(Cell::as_text)
                .map(|date| date.trim().to_string())
                .filter(|date| !date.is_empty());
        }
    }
    None
}
