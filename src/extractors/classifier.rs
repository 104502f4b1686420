// src/extractors/classifier.rs
//
// Converts the data rows of a resolved sheet into a per-document extraction
// record. Rows classify against the spec's line-item rules in declared order,
// first match wins; everything unmatched is retained verbatim as a residual
// item. Duplicate derivations must agree or the whole sheet is rejected.

use indexmap::IndexMap;

use crate::extractors::locator::ResolvedSheet;
use crate::schema::StatementType;
use crate::utils::error::ExtractError;
use crate::workbook::Cell;

/// A canonical line item's value plus the raw row label that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalLine {
    pub value: f64,
    pub raw_label: String,
}

/// One document's extracted items for one statement type. Canonical keys keep
/// the registry's declared order; residual keys keep first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRecord {
    canonical: IndexMap<String, CanonicalLine>,
    residual: IndexMap<String, f64>,
}

impl ExtractionRecord {
    pub fn canonical(&self) -> impl Iterator<Item = (&str, &CanonicalLine)> {
        self.canonical.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn residual(&self) -> impl Iterator<Item = (&str, f64)> {
        self.residual.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn canonical_value(&self, key: &str) -> Option<f64> {
        self.canonical.get(key).map(|line| line.value)
    }

    fn insert_canonical(
        &mut self,
        statement: StatementType,
        key: &str,
        value: f64,
        raw_label: &str,
    ) -> Result<(), ExtractError> {
        if let Some(existing) = self.canonical.get(key) {
            if existing.value == value {
                return Ok(()); // re-derivation of the same value is fine
            }
            return Err(ExtractError::ConflictingValue {
                statement,
                key: key.to_string(),
                existing: existing.value,
                new: value,
            });
        }
        self.canonical.insert(
            key.to_string(),
            CanonicalLine {
                value,
                raw_label: raw_label.to_string(),
            },
        );
        Ok(())
    }

    fn insert_residual(
        &mut self,
        statement: StatementType,
        key: &str,
        value: f64,
    ) -> Result<(), ExtractError> {
        if let Some(existing) = self.residual.get(key) {
            if *existing == value {
                return Ok(());
            }
            return Err(ExtractError::ConflictingValue {
                statement,
                key: key.to_string(),
                existing: *existing,
                new: value,
            });
        }
        self.residual.insert(key.to_string(), value);
        Ok(())
    }
}

/// Classifies every data row of the resolved sheet.
pub fn classify(resolved: &ResolvedSheet<'_>) -> Result<ExtractionRecord, ExtractError> {
    let statement = resolved.spec.statement();
    let mut record = ExtractionRecord::default();

    for row in resolved.sheet.data_rows() {
        // Section headers, blank separators and narrative rows have no label
        // or no numeric value; skip them.
        let Some(label) = row
            .first()
            .and_then(Cell::as_text)
            .map(str::trim)
            .filter(|label| !label.is_empty())
        else {
            continue;
        };

        let value = match row.get(1).unwrap_or(&Cell::Empty) {
            Cell::Number(n) if n.is_nan() => continue,
            Cell::Number(n) => *n,
            Cell::Empty => continue,
            Cell::Text(raw) => match normalize_numeric(raw) {
                NumericText::Value(v) => v,
                NumericText::Narrative => continue,
                NumericText::Malformed => {
                    return Err(ExtractError::InvalidNumericValue {
                        statement,
                        label: label.to_string(),
                        raw: raw.clone(),
                    })
                }
            },
        };

        let match_key = label.to_lowercase();
        match resolved.spec.classify_label(&match_key) {
            Some(rule) => {
                tracing::debug!("{} major: {} = {} ('{}')", statement, rule.key(), value, label);
                record.insert_canonical(statement, rule.key(), value, label)?;
            }
            None => {
                tracing::debug!("{} minor: {} = {}", statement, match_key, value);
                record.insert_residual(statement, &match_key, value)?;
            }
        }
    }

    Ok(record)
}

enum NumericText {
    Value(f64),
    Narrative,
    Malformed,
}

/// Normalizes a text value cell.
///
/// Digit-free text is narrative and skippable. Text containing a digit is
/// numeric-looking and must normalize: currency symbols, thousands separators
/// and spaces are stripped, one enclosing parenthesis pair negates, and the
/// remainder must parse as a float.
fn normalize_numeric(raw: &str) -> NumericText {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return NumericText::Narrative;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' ' | '\u{a0}'))
        .collect();

    let (body, negative) = match cleaned
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (inner, true),
        None => (cleaned.as_str(), false),
    };

    match body.parse::<f64>() {
        Ok(v) if !v.is_nan() => NumericText::Value(if negative { -v } else { v }),
        _ => NumericText::Malformed,
    }
}
