//! The BibTeX output stream.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::CitationRecord;

/// Where records go: standard output (`-`) or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// Parse a command-line destination, where `-` means standard output.
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Destination::Stdout
        } else {
            Destination::File(PathBuf::from(value))
        }
    }
}

/// One output handle shared by the whole run. Records are written in the
/// order they are produced, each followed by a newline.
pub struct OutputSink {
    writer: Box<dyn Write + Send>,
    label: String,
    written: usize,
}

impl OutputSink {
    /// Open the destination. Files are truncated unless `append` is set.
    pub fn open(destination: &Destination, append: bool) -> io::Result<Self> {
        match destination {
            Destination::Stdout => Ok(Self::stdout()),
            Destination::File(path) => Self::file(path, append),
        }
    }

    pub fn stdout() -> Self {
        Self::from_writer(io::stdout(), "<stdout>")
    }

    pub fn file(path: &Path, append: bool) -> io::Result<Self> {
        let file: File = if append {
            OpenOptions::new().create(true).append(true).open(path)?
        } else {
            File::create(path)?
        };
        Ok(Self::from_writer(
            BufWriter::new(file),
            path.display().to_string(),
        ))
    }

    pub fn from_writer(writer: impl Write + Send + 'static, label: impl Into<String>) -> Self {
        Self {
            writer: Box::new(writer),
            label: label.into(),
            written: 0,
        }
    }

    /// Append a record plus a trailing newline and flush, so everything
    /// written so far survives an aborted run.
    pub fn write_record(&mut self, record: &CitationRecord) -> io::Result<()> {
        self.writer.write_all(record.as_str().as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Human-readable destination name
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("label", &self.label)
            .field("written", &self.written)
            .finish()
    }
}
