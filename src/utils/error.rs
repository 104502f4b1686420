// src/utils/error.rs
#![allow(dead_code)]
use std::path::PathBuf;
use thiserror::Error;

use crate::schema::StatementType;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no sheet matches the {statement} name patterns")]
    SheetNotFound { statement: StatementType },

    #[error("multiple sheets match the {statement} name patterns: {candidates:?}")]
    AmbiguousSheet {
        statement: StatementType,
        candidates: Vec<String>,
    },

    #[error("{statement}: conflicting values for '{key}': {existing} vs {new}")]
    ConflictingValue {
        statement: StatementType,
        key: String,
        existing: f64,
        new: f64,
    },

    #[error("{statement}: cannot interpret value {raw:?} in row '{label}' as a number")]
    InvalidNumericValue {
        statement: StatementType,
        label: String,
        raw: String,
    },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("document unavailable: {path}: {source}")]
    DocumentUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed workbook {path}: {source}")]
    MalformedWorkbook {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot scan cache directory {path}: {source}")]
    CacheScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A failure while extracting one document, wrapped with the document identity
/// so batch-level reporting can always name the offending filing.
#[derive(Error, Debug)]
#[error("document '{document}': {source}")]
pub struct DocumentError {
    pub document: String,
    #[source]
    pub source: DocumentFailure,
}

impl DocumentError {
    pub fn new(document: &str, source: impl Into<DocumentFailure>) -> Self {
        Self {
            document: document.to_string(),
            source: source.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DocumentFailure {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Document source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Extraction failed: {0}")]
    Document(#[from] DocumentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
