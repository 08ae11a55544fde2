//! First-page text extraction with poppler's `pdftotext`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::{checked_stdout, path_arg, spawn_error, TextExtractor, ToolError};

/// Runs `pdftotext -l 1 <file> -` and lowercases the result.
#[derive(Debug, Clone)]
pub struct PdftotextExtractor {
    program: PathBuf,
}

impl PdftotextExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

#[async_trait]
impl TextExtractor for PdftotextExtractor {
    async fn first_page_text(&self, pdf_path: &Path) -> Result<String, ToolError> {
        let tool = self.tool_name();
        tracing::debug!(tool = %tool, path = %pdf_path.display(), "extracting first page");

        let output = Command::new(&self.program)
            .args(["-l", "1", "-enc", "UTF-8"])
            .arg(path_arg(pdf_path))
            .arg("-")
            .output()
            .await
            .map_err(|e| spawn_error(&tool, e))?;

        let text = checked_stdout(&tool, output)?;
        if text.trim().is_empty() {
            // Usually a scanned, image-only page.
            tracing::debug!(path = %pdf_path.display(), "first page has no text layer");
        }

        Ok(text.to_lowercase())
    }
}
