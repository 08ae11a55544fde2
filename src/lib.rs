//! # pdf2bib
//!
//! Recover BibTeX records for PDF papers. A DOI is read off the first page,
//! or looked up by the page's opening words, and exchanged for a citation
//! record through CrossRef. Files can then be renamed after their titles,
//! with the record cached in their metadata for the next run.
//!
//! ## Architecture
//!
//! - [`models`]: DOIs and citation records
//! - [`resolver`]: DOI pattern matching with the fulltext fallback
//! - [`sources`]: bibliography services (CrossRef)
//! - [`tools`]: `pdftotext` and `exiftool` wrappers
//! - [`pipeline`]: the per-file flow, renaming and batch reports
//! - [`output`]: the BibTeX output stream
//! - [`config`]: configuration management
//! - [`ui`]: terminal status output
//! - [`utils`]: HTTP client and filename validation

pub mod config;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod sources;
pub mod tools;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{CitationRecord, Doi};
pub use pipeline::{BatchReport, Options, Pipeline};
pub use sources::{BibliographySource, CrossRefSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
