//! Per-file outcomes and batch totals.

use std::path::PathBuf;

use super::{ProcessError, RecordOrigin};
use crate::models::CitationRecord;

/// A file that went through the pipeline successfully
#[derive(Debug, Clone)]
pub struct Processed {
    pub record: CitationRecord,
    pub origin: RecordOrigin,
    /// New location when the file was renamed
    pub renamed_to: Option<PathBuf>,
}

/// What happened to one input file
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<Processed, ProcessError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a whole run, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// Files never attempted because the run stopped early
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &ProcessError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.path, e)))
    }

    /// True when every input was processed and none failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped.is_empty()
    }
}
