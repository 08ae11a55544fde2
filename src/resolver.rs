//! DOI resolution from first-page text.
//!
//! A DOI printed on the page is trusted first. Only when the text carries no
//! DOI does the resolver fall back to a fulltext search with the opening
//! words of the page, and only when there are enough of them to make a match
//! meaningful.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::models::Doi;
use crate::sources::{BibliographySource, SourceError};

/// Words taken from the start of the page for a fulltext query
pub const MAX_QUERY_WORDS: usize = 20;

/// Fewer words than this never reach the bibliography service
pub const MIN_QUERY_WORDS: usize = 5;

/// Heuristic DOI pattern, tuned to text as `pdftotext` lays it out.
///
/// Optional `doi` / `doi.org/` lead-in, up to two separator characters, a
/// `10.NNNN` registrant prefix, then the shortest suffix that is followed by
/// an optional dot and an uppercase letter, whitespace, a comma or the end of
/// a line.
const DOI_PATTERN: &str =
    r"(?m)(?:doi|doi\.org/)?[\s[:punct:]]{0,2}(10\.[0-9]{4}[0-9:.\n?\-/a-z]+?)\.?(?:[A-Z\s,]|$)";

static DOI_RE: OnceLock<Regex> = OnceLock::new();

fn doi_regex() -> &'static Regex {
    DOI_RE.get_or_init(|| Regex::new(DOI_PATTERN).expect("DOI pattern is valid"))
}

/// Errors from DOI resolution
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Too little text for a fulltext lookup
    #[error(
        "insufficient context: {words} words on the first page, at least {min} needed for a lookup",
        min = MIN_QUERY_WORDS
    )]
    InsufficientContext { words: usize },

    /// The fulltext lookup failed or found nothing
    #[error("fulltext lookup failed: {0}")]
    Lookup(#[from] SourceError),
}

/// How a DOI was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoiOrigin {
    /// Printed in the document text
    Pattern,
    /// First hit of a fulltext search
    Search,
}

impl fmt::Display for DoiOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoiOrigin::Pattern => f.write_str("text"),
            DoiOrigin::Search => f.write_str("fulltext search"),
        }
    }
}

/// A DOI together with the way it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDoi {
    pub doi: Doi,
    pub origin: DoiOrigin,
}

/// Find the first DOI printed in the text, if any.
pub fn find_doi(text: &str) -> Option<Doi> {
    doi_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| Doi::from_match(m.as_str()))
}

/// The opening words of the text used as a fulltext query.
pub fn query_words(text: &str) -> Result<Vec<&str>, ResolveError> {
    let words: Vec<&str> = text.split_whitespace().take(MAX_QUERY_WORDS).collect();
    if words.len() < MIN_QUERY_WORDS {
        return Err(ResolveError::InsufficientContext { words: words.len() });
    }
    Ok(words)
}

/// Resolve a DOI from lowercase first-page text.
///
/// The pattern match runs first and never touches the network. Otherwise a
/// single search is issued and its first result taken as is.
pub async fn resolve_doi(
    text: &str,
    source: &dyn BibliographySource,
) -> Result<ResolvedDoi, ResolveError> {
    if let Some(doi) = find_doi(text) {
        tracing::info!(doi = %doi, "DOI found in text");
        return Ok(ResolvedDoi {
            doi,
            origin: DoiOrigin::Pattern,
        });
    }

    let words = query_words(text)?;
    tracing::info!(
        words = words.len(),
        source = source.name(),
        "no DOI in text, running fulltext lookup"
    );

    let doi = source.search_first_doi(&words).await?;
    tracing::info!(doi = %doi, "DOI found by fulltext lookup");

    Ok(ResolvedDoi {
        doi,
        origin: DoiOrigin::Search,
    })
}
