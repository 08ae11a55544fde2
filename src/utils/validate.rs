//! Filename validation for title-based renames.
//!
//! Titles come from remote data or from metadata anyone could have edited,
//! so they are never trusted as paths.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid filename: title {0:?} leaves nothing usable")]
    InvalidFilename(String),
}

/// Longest filename most filesystems accept, in bytes
const MAX_FILENAME_LENGTH: usize = 255;

/// Build `<title>.pdf` from a citation title.
///
/// Path separators and NUL bytes are removed so the result is always a
/// single path component. Whitespace runs (titles often wrap across lines)
/// collapse to one space. Titles made only of dots are rejected, as is
/// anything empty after cleaning. Over-long names are cut on a character
/// boundary, keeping the extension.
pub fn title_filename(title: &str) -> Result<String, ValidationError> {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(ValidationError::InvalidFilename(title.to_string()));
    }

    const EXT: &str = ".pdf";
    let budget = MAX_FILENAME_LENGTH - EXT.len();
    let mut stem = cleaned.as_str();
    if stem.len() > budget {
        let mut end = budget;
        while !stem.is_char_boundary(end) {
            end -= 1;
        }
        stem = stem[..end].trim_end();
    }

    Ok(format!("{}{}", stem, EXT))
}
