// src/workbook/mod.rs
//
// In-memory workbook model, the concrete shape of the spreadsheet adapter
// boundary. Numeric vs text cell typing is preserved from the source format by
// the untagged serde representation (JSON numbers stay numbers, strings stay
// strings, null is an empty cell).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One sheet: the stored (possibly length-truncated) name plus the cell grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// The sheet's full name, recovered from the designated first cell.
    ///
    /// Spreadsheet sheet names are length-limited, so the stored name may be
    /// truncated; the first cell of the sheet carries the authoritative label.
    /// Returns None when that cell is absent or not text.
    pub fn full_name(&self) -> Option<&str> {
        self.rows
            .first()
            .and_then(|row| row.first())
            .and_then(Cell::as_text)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// The data rows: everything after the header row.
    pub fn data_rows(&self) -> impl Iterator<Item = &Vec<Cell>> {
        self.rows.iter().skip(1)
    }
}

/// An ordered collection of named sheets, loaded from one input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}
