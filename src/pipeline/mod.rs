//! The per-file pipeline.
//!
//! For every input, in order:
//!
//! 1. unless forced, reuse the record embedded in the file's metadata
//! 2. otherwise extract the first page, resolve a DOI and fetch its record
//! 3. append the record to the output
//! 4. optionally rename the file after its title and embed the record
//!
//! A failing file is reported and, unless `fail_fast` is set, the run moves
//! on to the next one. Only an output write error stops the run outright,
//! since every later record would be lost as well.

mod rename;
mod report;

pub use rename::{move_file, rename_target, RenameError};
pub use report::{BatchReport, FileOutcome, Processed};

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::CitationRecord;
use crate::output::OutputSink;
use crate::resolver::{resolve_doi, ResolveError, ResolvedDoi};
use crate::sources::{BibliographySource, SourceError};
use crate::tools::{MetadataStore, TextExtractor, ToolError};

/// Switches taken from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Ignore embedded records and always resolve through a DOI
    pub force: bool,
    /// Rename each file after its title and embed the record
    pub rename: bool,
    /// Stop at the first failing file
    pub fail_fast: bool,
}

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Cached in the file's metadata
    Embedded,
    /// Fetched from the bibliography service
    Fetched(ResolvedDoi),
}

/// Why no record could be obtained for a file
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("citation fetch failed: {0}")]
    Fetch(#[source] SourceError),
}

/// Errors that fail a single file
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("text extraction failed for {}: {source}", .path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("no DOI found for {}: {source}", .path.display())]
    NoDoi {
        path: PathBuf,
        #[source]
        source: LookupError,
    },

    #[error("could not rename {}: {source}", .path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: RenameError,
    },

    #[error("could not tag {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: ToolError,
    },
}

impl ProcessError {
    /// Short error category for reports
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::Extraction { .. } => "extraction",
            ProcessError::NoDoi {
                source: LookupError::Resolve(ResolveError::InsufficientContext { .. }),
                ..
            } => "insufficient-context",
            ProcessError::NoDoi {
                source: LookupError::Resolve(ResolveError::Lookup(_)),
                ..
            } => "doi-lookup",
            ProcessError::NoDoi {
                source: LookupError::Fetch(_),
                ..
            } => "citation-fetch",
            ProcessError::Rename {
                source: RenameError::MissingTitle,
                ..
            } => "missing-title",
            ProcessError::Rename { .. } => "rename",
            ProcessError::Metadata { .. } => "metadata",
        }
    }
}

/// Runs documents through extraction, resolution, output and renaming.
pub struct Pipeline {
    source: Arc<dyn BibliographySource>,
    extractor: Arc<dyn TextExtractor>,
    metadata: Arc<dyn MetadataStore>,
    options: Options,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn BibliographySource>,
        extractor: Arc<dyn TextExtractor>,
        metadata: Arc<dyn MetadataStore>,
        options: Options,
    ) -> Self {
        Self {
            source,
            extractor,
            metadata,
            options,
        }
    }

    /// Process every path, writing records to `sink`.
    pub async fn run(&self, paths: &[PathBuf], sink: &mut OutputSink) -> io::Result<BatchReport> {
        self.run_with(paths, sink, |_| {}).await
    }

    /// Like [`Pipeline::run`], calling `on_outcome` after each file.
    pub async fn run_with<F>(
        &self,
        paths: &[PathBuf],
        sink: &mut OutputSink,
        mut on_outcome: F,
    ) -> io::Result<BatchReport>
    where
        F: FnMut(&FileOutcome),
    {
        let mut report = BatchReport::default();

        for (index, path) in paths.iter().enumerate() {
            let result = self.process(path, sink).await?;

            if let Err(err) = &result {
                tracing::warn!(
                    path = %path.display(),
                    kind = err.kind(),
                    "{}",
                    err
                );
            }

            let outcome = FileOutcome {
                path: path.clone(),
                result,
            };
            on_outcome(&outcome);
            let failed = !outcome.is_success();
            report.outcomes.push(outcome);

            if failed && self.options.fail_fast {
                report.skipped = paths[index + 1..].to_vec();
                if !report.skipped.is_empty() {
                    tracing::warn!(
                        skipped = report.skipped.len(),
                        "stopping after first failure"
                    );
                }
                break;
            }
        }

        Ok(report)
    }

    /// One file. The outer error is a failed output write, the inner one a
    /// failure of this file alone.
    async fn process(
        &self,
        path: &Path,
        sink: &mut OutputSink,
    ) -> io::Result<Result<Processed, ProcessError>> {
        let (record, origin) = match self.obtain_record(path).await {
            Ok(found) => found,
            Err(err) => return Ok(Err(err)),
        };

        sink.write_record(&record)?;

        let renamed_to = if self.options.rename {
            match self.rename_and_tag(path, &record).await {
                Ok(target) => Some(target),
                Err(err) => return Ok(Err(err)),
            }
        } else {
            None
        };

        Ok(Ok(Processed {
            record,
            origin,
            renamed_to,
        }))
    }

    /// Get the citation record for a file: embedded if allowed and present,
    /// otherwise resolved through its DOI.
    pub async fn obtain_record(
        &self,
        path: &Path,
    ) -> Result<(CitationRecord, RecordOrigin), ProcessError> {
        if !self.options.force {
            match self.metadata.read_record(path).await {
                Ok(record) if !record.is_empty() => {
                    tracing::info!(path = %path.display(), "using embedded record");
                    return Ok((record, RecordOrigin::Embedded));
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        "could not read embedded record, resolving instead: {}",
                        err
                    );
                }
            }
        }

        let text = self
            .extractor
            .first_page_text(path)
            .await
            .map_err(|source| ProcessError::Extraction {
                path: path.to_path_buf(),
                source,
            })?;

        let resolved = resolve_doi(&text, self.source.as_ref())
            .await
            .map_err(|e| ProcessError::NoDoi {
                path: path.to_path_buf(),
                source: LookupError::Resolve(e),
            })?;

        let record = self
            .source
            .fetch_bibtex(&resolved.doi)
            .await
            .map_err(|e| ProcessError::NoDoi {
                path: path.to_path_buf(),
                source: LookupError::Fetch(e),
            })?;

        tracing::info!(
            path = %path.display(),
            doi = %resolved.doi,
            via = %resolved.origin,
            "fetched record"
        );

        Ok((record, RecordOrigin::Fetched(resolved)))
    }

    /// Rename the file after the record's title, then embed the record in
    /// the renamed file. Returns the new path.
    pub async fn rename_and_tag(
        &self,
        path: &Path,
        record: &CitationRecord,
    ) -> Result<PathBuf, ProcessError> {
        let rename_err = |source| ProcessError::Rename {
            path: path.to_path_buf(),
            source,
        };

        let target = rename_target(path, record).map_err(rename_err)?;
        move_file(path, &target).await.map_err(rename_err)?;
        tracing::info!(from = %path.display(), to = %target.display(), "renamed");

        self.metadata
            .write_record(&target, record)
            .await
            .map_err(|source| ProcessError::Metadata {
                path: target.clone(),
                source,
            })?;

        Ok(target)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source.name())
            .field("options", &self.options)
            .finish()
    }
}
