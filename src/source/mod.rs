// src/source/mod.rs
//
// Where documents come from. The scanner does not download anything: filings
// are workbook dumps already sitting in the local cache directory, named
// SYMBOL-YYYY-Q-10K.json (or -10Q). Opening a document yields an in-memory
// Workbook; everything upstream of that (xlsx conversion, syncing) lives
// outside this binary.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::error::SourceError;
use crate::workbook::Workbook;

static CACHE_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<symbol>[A-Z][A-Z.]*)-(?P<year>\d{4})-(?P<quarter>\d)-10[KQ]\.json$")
        .expect("Failed to compile CACHE_FILE_RE")
});

/// Identifies one input document: the id is the cache file stem and doubles as
/// the column key in the aggregated tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: String,
    pub path: PathBuf,
}

/// The acquisition seam: anything that can open a document as a Workbook.
pub trait DocumentSource: Send + Sync {
    fn open(&self, document: &DocumentRef) -> Result<Workbook, SourceError>;
}

/// Reads workbook dumps from the filing cache directory.
pub struct CacheDirSource {
    cache_dir: PathBuf,
}

impl CacheDirSource {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    /// Lists the cached filings for a symbol, sorted by filename (the year and
    /// quarter encoded in the name make that chronological). `since` keeps only
    /// filings from that year onward.
    pub fn list_documents(
        &self,
        symbol: &str,
        since: Option<u16>,
    ) -> Result<Vec<DocumentRef>, SourceError> {
        let symbol = symbol.to_uppercase();
        let entries = fs::read_dir(&self.cache_dir).map_err(|e| SourceError::CacheScan {
            path: self.cache_dir.clone(),
            source: e,
        })?;

        let mut selected = Vec::new();
        let mut rejected = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SourceError::CacheScan {
                path: self.cache_dir.clone(),
                source: e,
            })?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(caps) = CACHE_FILE_RE.captures(name) else {
                continue;
            };
            if &caps["symbol"] != symbol {
                continue;
            }
            let year: u16 = caps["year"].parse().unwrap_or(0);
            if since.is_some_and(|min| year < min) {
                rejected.push(name.to_string());
                continue;
            }
            selected.push(name.to_string());
        }
        selected.sort();

        tracing::debug!(
            "cache scan for {}: selected [{}], rejected [{}]",
            symbol,
            selected.join(", "),
            rejected.join(", ")
        );

        Ok(selected
            .into_iter()
            .map(|name| DocumentRef {
                id: name.trim_end_matches(".json").to_string(),
                path: self.cache_dir.join(name),
            })
            .collect())
    }
}

impl DocumentSource for CacheDirSource {
    fn open(&self, document: &DocumentRef) -> Result<Workbook, SourceError> {
        let bytes = fs::read(&document.path).map_err(|e| SourceError::DocumentUnavailable {
            path: document.path.clone(),
            source: e,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::MalformedWorkbook {
            path: document.path.clone(),
            source: e,
        })
    }
}

/// In-memory source, for tests and embedding.
#[derive(Default)]
pub struct MemorySource {
    workbooks: HashMap<String, Workbook>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a workbook and hands back the ref to open it with.
    pub fn insert(&mut self, id: &str, workbook: Workbook) -> DocumentRef {
        self.workbooks.insert(id.to_string(), workbook);
        DocumentRef {
            id: id.to_string(),
            path: PathBuf::from(id),
        }
    }
}

impl DocumentSource for MemorySource {
    fn open(&self, document: &DocumentRef) -> Result<Workbook, SourceError> {
        self.workbooks
            .get(&document.id)
            .cloned()
            .ok_or_else(|| SourceError::DocumentUnavailable {
                path: document.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not registered"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{Cell, Sheet};

    fn write_file(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn lists_only_matching_filings_in_filename_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "GOOG-2017-2-10Q.json", "{}");
        write_file(dir.path(), "GOOG-2015-4-10K.json", "{}");
        write_file(dir.path(), "AAPL-2016-4-10K.json", "{}");
        write_file(dir.path(), "notes.txt", "irrelevant");

        let source = CacheDirSource::new(dir.path());
        let docs = source.list_documents("goog", None).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["GOOG-2015-4-10K", "GOOG-2017-2-10Q"]);
    }

    #[test]
    fn since_filter_drops_older_filings() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "GOOG-2015-4-10K.json", "{}");
        write_file(dir.path(), "GOOG-2017-2-10Q.json", "{}");

        let source = CacheDirSource::new(dir.path());
        let docs = source.list_documents("GOOG", Some(2016)).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["GOOG-2017-2-10Q"]);
    }

    #[test]
    fn open_reads_a_workbook_dump() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "GOOG-2015-4-10K.json",
            r#"{"sheets":[{"name":"S1","rows":[["Consolidated Balance Sheets"],["Total assets",500000.0]]}]}"#,
        );

        let source = CacheDirSource::new(dir.path());
        let docs = source.list_documents("GOOG", None).unwrap();
        let workbook = source.open(&docs[0]).unwrap();
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(
            workbook.sheets[0].full_name(),
            Some("Consolidated Balance Sheets")
        );
    }

    #[test]
    fn open_failures_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = CacheDirSource::new(dir.path());

        let missing = DocumentRef {
            id: "GOOG-2015-4-10K".to_string(),
            path: dir.path().join("GOOG-2015-4-10K.json"),
        };
        assert!(matches!(
            source.open(&missing),
            Err(SourceError::DocumentUnavailable { .. })
        ));

        write_file(dir.path(), "GOOG-2016-4-10K.json", "not json");
        let malformed = DocumentRef {
            id: "GOOG-2016-4-10K".to_string(),
            path: dir.path().join("GOOG-2016-4-10K.json"),
        };
        assert!(matches!(
            source.open(&malformed),
            Err(SourceError::MalformedWorkbook { .. })
        ));
    }

    #[test]
    fn memory_source_round_trips() {
        let mut source = MemorySource::new();
        let doc = source.insert(
            "TEST-2020-4-10K",
            Workbook {
                sheets: vec![Sheet {
                    name: "S1".to_string(),
                    rows: vec![vec![Cell::Text("Consolidated Balance Sheets".to_string())]],
                }],
            },
        );
        assert!(source.open(&doc).is_ok());

        let unknown = DocumentRef {
            id: "OTHER".to_string(),
            path: PathBuf::from("OTHER"),
        };
        assert!(matches!(
            source.open(&unknown),
            Err(SourceError::DocumentUnavailable { .. })
        ));
    }
}
