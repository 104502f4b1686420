// src/extractors/mod.rs
pub mod classifier;
pub mod document;
pub mod locator;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use classifier::ExtractionRecord;
#[allow(unused_imports)]
pub use document::{DocumentExtractor, DocumentRecords};
#[allow(unused_imports)]
pub use locator::ResolvedSheet;
