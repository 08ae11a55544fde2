//! Integration tests for pdf2bib
//!
//! These drive the full pipeline with in-memory stand-ins for `pdftotext` and
//! `exiftool`, and either a mock CrossRef server or the mock source.

use async_trait::async_trait;
use mockito::Matcher;
use pdf2bib::config::CrossRefConfig;
use pdf2bib::models::{CitationRecord, Doi};
use pdf2bib::output::OutputSink;
use pdf2bib::pipeline::{Options, Pipeline, ProcessError, RecordOrigin};
use pdf2bib::resolver::DoiOrigin;
use pdf2bib::sources::{BibliographySource, CrossRefSource, MockSource};
use pdf2bib::tools::{MetadataStore, TextExtractor, ToolError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const ARTICLE: &str = "@article{Smith_2018, title={Quantum Dots in Nanowires}, \
    volume={112}, DOI={10.1063/1.5017455}, journal={Applied Physics Letters}, year={2018}}";

const NATURE: &str = "@article{Drews_2002, title={Drug discovery: a historical perspective}, \
    DOI={10.1038/nrd842}, journal={Nature Reviews Drug Discovery}, year={2002}}";

const NO_DOI_PAGE: &str = "drug discovery a historical perspective jurgen drews \
    roche research basel switzerland abstract the history of drug discovery shows that \
    new therapeutic principles emerge from basic research";

/// First-page text keyed by file name
#[derive(Default)]
struct FakeExtractor {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeExtractor {
    fn with_page(mut self, file: &str, text: &str) -> Self {
        self.pages.insert(file.to_string(), text.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn first_page_text(&self, pdf_path: &Path) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push(pdf_path.to_path_buf());
        let name = pdf_path.file_name().unwrap().to_string_lossy().to_string();
        Ok(self.pages.get(&name).cloned().unwrap_or_default())
    }
}

/// Embedded records keyed by path
#[derive(Default)]
struct MemoryMetadata {
    records: Mutex<HashMap<PathBuf, CitationRecord>>,
}

impl MemoryMetadata {
    fn get(&self, path: &Path) -> Option<CitationRecord> {
        self.records.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadata {
    async fn read_record(&self, pdf_path: &Path) -> Result<CitationRecord, ToolError> {
        Ok(self.get(pdf_path).unwrap_or_default())
    }

    async fn write_record(
        &self,
        pdf_path: &Path,
        record: &CitationRecord,
    ) -> Result<(), ToolError> {
        self.records
            .lock()
            .unwrap()
            .insert(pdf_path.to_path_buf(), record.clone());
        Ok(())
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn pdf(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();
        path
    }

    fn output_path(&self) -> PathBuf {
        self.dir.path().join("refs.bib")
    }

    fn sink(&self) -> OutputSink {
        OutputSink::file(&self.output_path(), false).unwrap()
    }

    fn output(&self) -> String {
        std::fs::read_to_string(self.output_path()).unwrap()
    }
}

fn pipeline(
    source: Arc<dyn BibliographySource>,
    extractor: Arc<FakeExtractor>,
    metadata: Arc<MemoryMetadata>,
    options: Options,
) -> Pipeline {
    Pipeline::new(source, extractor, metadata, options)
}

fn crossref(server: &mockito::ServerGuard) -> Arc<CrossRefSource> {
    Arc::new(
        CrossRefSource::new(&CrossRefConfig::default())
            .unwrap()
            .with_base_url(server.url()),
    )
}

#[tokio::test]
async fn test_doi_on_page_is_fetched_written_and_renamed() {
    let ws = Workspace::new();
    let pdf = ws.pdf("scan001.pdf");

    let mut server = mockito::Server::new_async().await;
    let search = server
        .mock("GET", "/works")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let transform = server
        .mock(
            "GET",
            Matcher::Regex(
                r"^/works/10\.1063(/|%2F)1\.5017455/transform/application/x-bibtex$".into(),
            ),
        )
        .with_status(200)
        .with_body(ARTICLE)
        .expect(1)
        .create_async()
        .await;

    let extractor = Arc::new(FakeExtractor::default().with_page(
        "scan001.pdf",
        "applied physics letters 112, 053101 (2018)\ndoi:10.1063/1.5017455 \nquantum dots",
    ));
    let metadata = Arc::new(MemoryMetadata::default());
    let pipeline = pipeline(
        crossref(&server),
        extractor,
        metadata.clone(),
        Options {
            rename: true,
            ..Options::default()
        },
    );

    let mut sink = ws.sink();
    let report = pipeline.run(&[pdf.clone()], &mut sink).await.unwrap();
    drop(sink);

    assert!(report.is_success());
    search.assert_async().await;
    transform.assert_async().await;

    let output = ws.output();
    assert_eq!(output, format!("{}\n", ARTICLE));
    assert!(output.contains("DOI={10.1063/1.5017455}"));

    let target = ws.dir.path().join("Quantum Dots in Nanowires.pdf");
    assert!(!pdf.exists());
    assert!(target.exists());
    assert_eq!(metadata.get(&target).unwrap().as_str(), ARTICLE);

    let processed = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(processed.renamed_to.as_deref(), Some(target.as_path()));
    match &processed.origin {
        RecordOrigin::Fetched(resolved) => {
            assert_eq!(resolved.doi.as_str(), "10.1063/1.5017455");
            assert_eq!(resolved.origin, DoiOrigin::Pattern);
        }
        other => panic!("unexpected origin {:?}", other),
    }
}

#[tokio::test]
async fn test_fulltext_fallback_uses_first_twenty_words() {
    let ws = Workspace::new();
    let pdf = ws.pdf("drews.pdf");

    let expected_query = NO_DOI_PAGE
        .split_whitespace()
        .take(20)
        .collect::<Vec<_>>()
        .join(" ");

    let mut server = mockito::Server::new_async().await;
    let search = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded(
            "query.bibliographic".into(),
            expected_query,
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":{"items":[{"DOI":"10.1038/nrd842"}]}}"#)
        .expect(1)
        .create_async()
        .await;
    let transform = server
        .mock(
            "GET",
            Matcher::Regex(r"^/works/10\.1038(/|%2F)nrd842/transform/application/x-bibtex$".into()),
        )
        .with_status(200)
        .with_body(NATURE)
        .expect(1)
        .create_async()
        .await;

    let extractor = Arc::new(FakeExtractor::default().with_page("drews.pdf", NO_DOI_PAGE));
    let pipeline = pipeline(
        crossref(&server),
        extractor,
        Arc::new(MemoryMetadata::default()),
        Options::default(),
    );

    let mut sink = ws.sink();
    let report = pipeline.run(&[pdf], &mut sink).await.unwrap();
    drop(sink);

    assert!(report.is_success());
    search.assert_async().await;
    transform.assert_async().await;
    assert_eq!(ws.output(), format!("{}\n", NATURE));
}

#[tokio::test]
async fn test_embedded_record_skips_resolution() {
    let ws = Workspace::new();
    let pdf = ws.pdf("cached.pdf");

    let source = Arc::new(MockSource::new());
    let extractor = Arc::new(FakeExtractor::default());
    let metadata = Arc::new(MemoryMetadata::default());

    // Round trip through the store, then read back through the pipeline.
    metadata
        .write_record(&pdf, &CitationRecord::new(ARTICLE))
        .await
        .unwrap();

    let pipeline = pipeline(
        source.clone(),
        extractor.clone(),
        metadata,
        Options::default(),
    );

    let mut sink = ws.sink();
    let report = pipeline.run(&[pdf], &mut sink).await.unwrap();
    drop(sink);

    assert!(report.is_success());
    assert_eq!(ws.output(), format!("{}\n", ARTICLE));
    assert_eq!(
        report.outcomes[0].result.as_ref().unwrap().origin,
        RecordOrigin::Embedded
    );
    assert_eq!(extractor.calls(), 0);
    assert!(source.searches().is_empty());
    assert!(source.fetches().is_empty());
}

#[tokio::test]
async fn test_force_bypasses_embedded_record() {
    let ws = Workspace::new();
    let pdf = ws.pdf("cached.pdf");

    let source = Arc::new(MockSource::new());
    source.insert_record("10.1038/nrd842", NATURE);
    source.set_search_result(Doi::parse("10.1038/nrd842").unwrap());

    let extractor = Arc::new(FakeExtractor::default().with_page("cached.pdf", NO_DOI_PAGE));
    let metadata = Arc::new(MemoryMetadata::default());
    metadata
        .write_record(&pdf, &CitationRecord::new("@misc{stale, title={Stale}}"))
        .await
        .unwrap();

    let pipeline = pipeline(
        source.clone(),
        extractor.clone(),
        metadata,
        Options {
            force: true,
            ..Options::default()
        },
    );

    let mut sink = ws.sink();
    let report = pipeline.run(&[pdf], &mut sink).await.unwrap();
    drop(sink);

    assert!(report.is_success());
    assert_eq!(ws.output(), format!("{}\n", NATURE));
    assert_eq!(extractor.calls(), 1);
    assert_eq!(source.searches().len(), 1);
    assert_eq!(source.fetches(), vec![Doi::parse("10.1038/nrd842").unwrap()]);
}

#[tokio::test]
async fn test_failures_are_contained_and_reported() {
    let ws = Workspace::new();
    let scanned = ws.pdf("scanned.pdf");
    let good = ws.pdf("good.pdf");

    let source = Arc::new(MockSource::new());
    source.insert_record("10.1063/1.5017455", ARTICLE);

    let extractor = Arc::new(
        FakeExtractor::default()
            .with_page("scanned.pdf", "page 1")
            .with_page("good.pdf", "doi: 10.1063/1.5017455\n"),
    );
    let pipeline = pipeline(
        source.clone(),
        extractor,
        Arc::new(MemoryMetadata::default()),
        Options::default(),
    );

    let mut sink = ws.sink();
    let report = pipeline
        .run(&[scanned.clone(), good], &mut sink)
        .await
        .unwrap();
    drop(sink);

    assert!(!report.is_success());
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(source.searches().is_empty());

    let (path, err) = report.failures().next().unwrap();
    assert_eq!(path, &scanned);
    assert_eq!(err.kind(), "insufficient-context");
    assert!(err.to_string().starts_with("no DOI found for"));

    assert_eq!(ws.output(), format!("{}\n", ARTICLE));
}

#[tokio::test]
async fn test_fail_fast_skips_remaining_files() {
    let ws = Workspace::new();
    let first = ws.pdf("first.pdf");
    let second = ws.pdf("second.pdf");

    // No records registered: the fetch fails.
    let source = Arc::new(MockSource::new());
    let extractor = Arc::new(
        FakeExtractor::default()
            .with_page("first.pdf", "doi:10.1063/1.5017455 ")
            .with_page("second.pdf", "doi:10.1038/nrd842 "),
    );
    let pipeline = pipeline(
        source.clone(),
        extractor.clone(),
        Arc::new(MemoryMetadata::default()),
        Options {
            fail_fast: true,
            ..Options::default()
        },
    );

    let mut sink = ws.sink();
    let report = pipeline
        .run(&[first, second.clone()], &mut sink)
        .await
        .unwrap();
    drop(sink);

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.skipped, vec![second]);
    assert_eq!(extractor.calls(), 1);
    assert_eq!(source.fetches().len(), 1);

    let err = report.outcomes[0].result.as_ref().unwrap_err();
    assert_eq!(err.kind(), "citation-fetch");
    assert!(matches!(err, ProcessError::NoDoi { .. }));
    assert_eq!(ws.output(), "");
}

#[tokio::test]
async fn test_rename_without_title_keeps_output_and_file() {
    let ws = Workspace::new();
    let pdf = ws.pdf("untitled.pdf");

    let untitled = "@misc{anon, howpublished={Preprint}, DOI={10.1063/1.5017455}}";
    let source = Arc::new(MockSource::new());
    source.insert_record("10.1063/1.5017455", untitled);

    let extractor =
        Arc::new(FakeExtractor::default().with_page("untitled.pdf", "doi:10.1063/1.5017455 "));
    let metadata = Arc::new(MemoryMetadata::default());
    let pipeline = pipeline(
        source,
        extractor,
        metadata.clone(),
        Options {
            rename: true,
            ..Options::default()
        },
    );

    let mut sink = ws.sink();
    let report = pipeline.run(&[pdf.clone()], &mut sink).await.unwrap();
    drop(sink);

    let err = report.outcomes[0].result.as_ref().unwrap_err();
    assert_eq!(err.kind(), "missing-title");
    assert!(pdf.exists());
    assert!(metadata.get(&pdf).is_none());
    assert_eq!(ws.output(), format!("{}\n", untitled));
}

#[tokio::test]
async fn test_rename_never_leaves_directory() {
    let ws = Workspace::new();
    let pdf = ws.pdf("scan.pdf");

    let sneaky = "@article{x, title={../../outside/Escape Attempt}}";
    let source = Arc::new(MockSource::new());
    source.insert_record("10.1063/1.5017455", sneaky);

    let extractor =
        Arc::new(FakeExtractor::default().with_page("scan.pdf", "doi:10.1063/1.5017455 "));
    let pipeline = pipeline(
        source,
        extractor,
        Arc::new(MemoryMetadata::default()),
        Options {
            rename: true,
            ..Options::default()
        },
    );

    let mut sink = ws.sink();
    let report = pipeline.run(&[pdf], &mut sink).await.unwrap();
    drop(sink);

    let target = report.outcomes[0]
        .result
        .as_ref()
        .unwrap()
        .renamed_to
        .clone()
        .unwrap();
    assert_eq!(target.parent(), Some(ws.dir.path()));
    assert_eq!(target.file_name().unwrap(), "....outsideEscape Attempt.pdf");
    assert!(target.exists());
}
