//! Wrappers around the external programs the pipeline delegates to.
//!
//! - [`PdftotextExtractor`]: first-page text via poppler's `pdftotext`
//! - [`ExifToolStore`]: the embedded BibTeX record via `exiftool`
//!
//! Both sit behind small traits so the pipeline can be driven with in-memory
//! doubles.

mod exiftool;
mod pdftotext;

pub use exiftool::ExifToolStore;
pub use pdftotext::PdftotextExtractor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;

use crate::models::CitationRecord;

/// Extracts searchable text from a PDF.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Lowercased plain text of the first page.
    async fn first_page_text(&self, pdf_path: &Path) -> Result<String, ToolError>;
}

/// Reads and writes the citation record cached in a PDF's metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// The embedded record. An absent field yields an empty record.
    async fn read_record(&self, pdf_path: &Path) -> Result<CitationRecord, ToolError>;

    /// Store the record in the file's metadata, in place.
    async fn write_record(&self, pdf_path: &Path, record: &CitationRecord)
        -> Result<(), ToolError>;
}

/// Errors from running an external program
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{tool} is not installed or not on PATH")]
    NotInstalled { tool: String },

    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    #[error("{tool} returned non-UTF8 output: {source}")]
    InvalidOutput {
        tool: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map a spawn error, telling a missing binary apart from other failures.
fn spawn_error(tool: &str, err: std::io::Error) -> ToolError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ToolError::NotInstalled {
            tool: tool.to_string(),
        }
    } else {
        ToolError::Failed {
            tool: tool.to_string(),
            message: format!("could not run: {err}"),
        }
    }
}

/// Keep relative paths that start with `-` from being read as options.
fn path_arg(path: &Path) -> PathBuf {
    if path.is_relative() && path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// Turn a finished process into its stdout, or an error carrying stderr.
fn checked_stdout(tool: &str, output: Output) -> Result<String, ToolError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("exited with {} and no stderr output", output.status)
        } else {
            stderr
        };
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            message,
        });
    }

    String::from_utf8(output.stdout).map_err(|source| ToolError::InvalidOutput {
        tool: tool.to_string(),
        source,
    })
}
