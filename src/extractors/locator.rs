// src/extractors/locator.rs
//
// Finds the sheet implementing a statement type inside an arbitrary workbook.
// Matching runs against the full name recovered from each sheet's designated
// cell, never against the stored (possibly truncated) sheet name.

use crate::schema::StatementSpec;
use crate::utils::error::ExtractError;
use crate::workbook::{Sheet, Workbook};

/// A (spec, sheet) pairing plus the sheet's raw full name.
#[derive(Debug)]
pub struct ResolvedSheet<'a> {
    pub spec: &'a StatementSpec,
    pub sheet: &'a Sheet,
    pub full_name: String,
}

/// Locates the single sheet matching the spec's name patterns.
///
/// Zero matching sheets is an error, and so is more than one: a filing with
/// two balance sheets cannot be classified safely.
pub fn locate<'a>(
    workbook: &'a Workbook,
    spec: &'a StatementSpec,
) -> Result<ResolvedSheet<'a>, ExtractError> {
    let mut candidates: Vec<(&Sheet, String)> = Vec::new();
    for sheet in &workbook.sheets {
        let Some(full_name) = sheet.full_name() else {
            tracing::trace!("sheet '{}' has no usable full-name cell, skipping", sheet.name);
            continue;
        };
        if spec.sheet_matches(&full_name.to_lowercase()) {
            candidates.push((sheet, full_name.to_string()));
        }
    }

    match candidates.len() {
        0 => Err(ExtractError::SheetNotFound {
            statement: spec.statement(),
        }),
        1 => {
            let (sheet, full_name) = candidates.remove(0);
            tracing::debug!("found {} sheet: '{}'", spec.statement(), full_name);
            Ok(ResolvedSheet {
                spec,
                sheet,
                full_name,
            })
        }
        _ => Err(ExtractError::AmbiguousSheet {
            statement: spec.statement(),
            candidates: candidates.into_iter().map(|(_, name)| name).collect(),
        }),
    }
}
