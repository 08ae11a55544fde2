//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{CitationRecord, Doi};
use crate::sources::{BibliographySource, SourceError};

/// A mock source that returns predefined responses and records every call.
#[derive(Debug, Default)]
pub struct MockSource {
    search_result: Mutex<Option<Doi>>,
    records: Mutex<HashMap<String, CitationRecord>>,
    searches: Mutex<Vec<Vec<String>>>,
    fetches: Mutex<Vec<Doi>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the DOI returned by the next searches. Without one, searches
    /// fail with `NotFound`.
    pub fn set_search_result(&self, doi: Doi) {
        let mut guard = self.search_result.lock().unwrap();
        *guard = Some(doi);
    }

    /// Register the BibTeX record served for a DOI.
    pub fn insert_record(&self, doi: &str, record: impl Into<String>) {
        let mut guard = self.records.lock().unwrap();
        guard.insert(doi.to_string(), CitationRecord::new(record));
    }

    /// Word lists of all searches so far.
    pub fn searches(&self) -> Vec<Vec<String>> {
        self.searches.lock().unwrap().clone()
    }

    /// DOIs fetched so far.
    pub fn fetches(&self) -> Vec<Doi> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BibliographySource for MockSource {
    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search_first_doi(&self, words: &[&str]) -> Result<Doi, SourceError> {
        self.searches
            .lock()
            .unwrap()
            .push(words.iter().map(|w| w.to_string()).collect());

        let guard = self.search_result.lock().unwrap();
        match &*guard {
            Some(doi) => Ok(doi.clone()),
            None => Err(SourceError::NotFound("search returned no items".to_string())),
        }
    }

    async fn fetch_bibtex(&self, doi: &Doi) -> Result<CitationRecord, SourceError> {
        self.fetches.lock().unwrap().push(doi.clone());

        let guard = self.records.lock().unwrap();
        guard
            .get(doi.as_str())
            .cloned()
            .ok_or_else(|| SourceError::Api(format!("no record for {}: status 404", doi)))
    }
}
