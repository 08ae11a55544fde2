//! BibTeX citation records.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A formatted BibTeX entry, kept verbatim.
///
/// Records come either from the bibliography service or from a file's
/// embedded metadata. Only the title is ever read locally, so the
/// entry is not parsed up front.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationRecord(String);

impl CitationRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The braced value of the `title` field, if present.
    ///
    /// The field name matches case-insensitively and only as a whole word, so
    /// `booktitle` is never picked up. Nested braces inside the value are
    /// balanced and kept.
    pub fn title(&self) -> Option<String> {
        let start = title_regex().find(&self.0)?.end();

        let mut depth = 1usize;
        for (offset, ch) in self.0[start..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(self.0[start..start + offset].to_string());
                    }
                }
                _ => {}
            }
        }

        None
    }
}

static TITLE_RE: OnceLock<Regex> = OnceLock::new();

fn title_regex() -> &'static Regex {
    TITLE_RE.get_or_init(|| Regex::new(r"(?i)\btitle\s*=\s*\{").expect("title pattern is valid"))
}

impl fmt::Display for CitationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
