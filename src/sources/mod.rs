//! Bibliography service plugins.
//!
//! The pipeline talks to the remote bibliography service through the
//! [`BibliographySource`] trait. It needs exactly two operations from it:
//!
//! - a free-text bibliographic search that yields the DOI of the best match
//! - a DOI-to-BibTeX transform
//!
//! [`CrossRefSource`] implements both against the CrossRef REST API.
//! [`MockSource`] is an in-memory stand-in used by the tests.

mod crossref;
pub mod mock;

pub use crossref::{CrossRefSource, CROSSREF_API_BASE};
pub use mock::MockSource;

use crate::models::{CitationRecord, Doi};
use async_trait::async_trait;

/// A remote service that can find DOIs and format citation records.
#[async_trait]
pub trait BibliographySource: Send + Sync + std::fmt::Debug {
    /// Display name of this source
    fn name(&self) -> &str;

    /// Run a free-text bibliographic search with the given words and return
    /// the DOI of the first listed result.
    async fn search_first_doi(&self, words: &[&str]) -> Result<Doi, SourceError>;

    /// Exchange a DOI for a BibTeX citation record.
    async fn fetch_bibtex(&self, doi: &Doi) -> Result<CitationRecord, SourceError>;
}

/// Errors that can occur when talking to a bibliography service
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// The service answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// The service had nothing for the request
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}
