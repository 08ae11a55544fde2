//! DOI model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when a string does not look like a DOI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid DOI: {0:?}")]
pub struct InvalidDoi(pub String);

/// A Digital Object Identifier of the form `10.NNNN/suffix`.
///
/// The value is kept exactly as it was found, without case folding, so the
/// identifier written to the output matches what the document or the
/// bibliography service reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi(String);

impl Doi {
    /// Parse a DOI, accepting the usual resolver and `doi:` prefixes.
    pub fn parse(input: &str) -> Result<Self, InvalidDoi> {
        let trimmed = input.trim();

        let stripped = [
            "https://doi.org/",
            "http://doi.org/",
            "https://dx.doi.org/",
            "http://dx.doi.org/",
            "doi:",
            "DOI:",
        ]
        .into_iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .map(str::trim_start)
        .unwrap_or(trimmed);

        let Some(rest) = stripped.strip_prefix("10.") else {
            return Err(InvalidDoi(input.to_string()));
        };
        let Some((registrant, suffix)) = rest.split_once('/') else {
            return Err(InvalidDoi(input.to_string()));
        };
        if registrant.is_empty()
            || !registrant.chars().all(|c| c.is_ascii_digit() || c == '.')
            || suffix.is_empty()
            || stripped.chars().any(char::is_whitespace)
        {
            return Err(InvalidDoi(input.to_string()));
        }

        Ok(Self(stripped.to_string()))
    }

    /// Build a DOI from a pattern match that already satisfied the
    /// registrant-prefix syntax. Embedded line breaks are removed.
    pub(crate) fn from_match(matched: &str) -> Self {
        Self(matched.chars().filter(|c| *c != '\n' && *c != '\r').collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Doi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Doi {
    type Error = InvalidDoi;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Doi::parse(&value)
    }
}

impl From<Doi> for String {
    fn from(doi: Doi) -> Self {
        doi.0
    }
}
