//! Title-based renaming and tagging.

use std::io;
use std::path::{Path, PathBuf};

use crate::models::CitationRecord;
use crate::utils::{title_filename, ValidationError};

/// Errors from renaming a file after its title
#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    #[error("citation record has no title field")]
    MissingTitle,

    #[error(transparent)]
    InvalidTitle(#[from] ValidationError),

    #[error("target {0} already exists")]
    TargetExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The path `<title>.pdf` next to the original file.
///
/// The filename is a single sanitized component, so the target always stays
/// in the original file's directory.
pub fn rename_target(path: &Path, record: &CitationRecord) -> Result<PathBuf, RenameError> {
    let title = record.title().ok_or(RenameError::MissingTitle)?;
    let filename = title_filename(&title)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    Ok(dir.join(filename))
}

/// Move `path` to `target`, refusing to replace an unrelated file.
pub async fn move_file(path: &Path, target: &Path) -> Result<(), RenameError> {
    if tokio::fs::try_exists(target).await? && !same_file(path, target).await {
        return Err(RenameError::TargetExists(target.to_path_buf()));
    }

    tokio::fs::rename(path, target).await?;
    Ok(())
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
