//! Input loading: read the score list into ordered archive paths.
//!
//! The list is plain text, one archive path per line. Lines are trimmed;
//! blank lines and `#` comments are skipped. Paths are not checked here;
//! a missing archive surfaces later as a per-score extraction failure.

use crate::error::BookError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read the score list at `path`, preserving file order.
pub async fn read_score_list(path: &Path) -> Result<Vec<PathBuf>, BookError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BookError::InputListNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => BookError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => BookError::InputListRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

    let scores = parse_score_list(&text);
    debug!("Read {} scores from {}", scores.len(), path.display());
    Ok(scores)
}

/// Split score-list text into archive paths.
pub fn parse_score_list(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}
