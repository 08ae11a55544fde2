//! Embedded citation records through `exiftool`.
//!
//! The record lives in a custom `XMP-pdfx` tag. Reading needs no setup, but
//! exiftool only writes tags it knows about, so every write registers the tag
//! in a throwaway config file first.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::{checked_stdout, path_arg, spawn_error, MetadataStore, ToolError};
use crate::models::CitationRecord;

/// Reads and writes the BibTeX record stored in `XMP-pdfx:<tag>`.
#[derive(Debug, Clone)]
pub struct ExifToolStore {
    program: PathBuf,
    tag: String,
}

impl ExifToolStore {
    pub fn new(program: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            tag: tag.into(),
        }
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Perl snippet declaring the custom tag. The tag name is spliced into
    /// code, so only plain identifiers are accepted.
    fn schema_config(&self) -> Result<String, ToolError> {
        let valid = self
            .tag
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ToolError::Failed {
                tool: self.tool_name(),
                message: format!("invalid metadata tag name: {:?}", self.tag),
            });
        }

        Ok(format!(
            "%Image::ExifTool::UserDefined = (\n    \
             'Image::ExifTool::XMP::pdfx' => {{\n        \
             {} => {{ }},\n    \
             }},\n\
             );\n\
             1;\n",
            self.tag
        ))
    }

    /// Write the schema into a temp file that is deleted when dropped.
    fn schema_file(&self) -> Result<NamedTempFile, ToolError> {
        let contents = self.schema_config()?;
        let mut file = tempfile::Builder::new()
            .prefix("pdf2bib-exiftool-")
            .suffix(".config")
            .tempfile()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

impl Default for ExifToolStore {
    fn default() -> Self {
        Self::new("exiftool", "BibTeX")
    }
}

#[async_trait]
impl MetadataStore for ExifToolStore {
    async fn read_record(&self, pdf_path: &Path) -> Result<CitationRecord, ToolError> {
        let tool = self.tool_name();
        tracing::debug!(tool = %tool, path = %pdf_path.display(), "reading embedded record");

        let output = Command::new(&self.program)
            .arg("-b")
            .arg(format!("-{}", self.tag))
            .arg(path_arg(pdf_path))
            .output()
            .await
            .map_err(|e| spawn_error(&tool, e))?;

        // `-b` prints the stored value exactly, with no trailing newline.
        let text = checked_stdout(&tool, output)?;
        Ok(CitationRecord::new(text))
    }

    async fn write_record(
        &self,
        pdf_path: &Path,
        record: &CitationRecord,
    ) -> Result<(), ToolError> {
        let tool = self.tool_name();
        // Lives until the end of this call, on every path.
        let schema = self.schema_file()?;
        tracing::debug!(
            tool = %tool,
            path = %pdf_path.display(),
            config = %schema.path().display(),
            "writing embedded record"
        );

        let output = Command::new(&self.program)
            .arg("-config")
            .arg(schema.path())
            .arg("-overwrite_original")
            .arg(format!("-XMP-pdfx:{}={}", self.tag, record.as_str()))
            .arg(path_arg(pdf_path))
            .output()
            .await
            .map_err(|e| spawn_error(&tool, e))?;

        checked_stdout(&tool, output)?;
        Ok(())
    }
}
