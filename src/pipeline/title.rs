//! Title lookup in the inner score document.
//!
//! MuseScore stores work metadata as `<metaTag name="…">value</metaTag>`
//! elements under `<Score>`. The first `metaTag` anywhere in the tree whose
//! `name` is `workTitle` supplies the title; an absent tag or blank text
//! falls back to the archive's file stem.

use crate::error::ScoreError;
use std::path::Path;

/// Element name carrying score metadata.
pub const META_TAG: &str = "metaTag";

/// `name` attribute value marking the work title.
pub const WORK_TITLE: &str = "workTitle";

/// Find the work title in an XML document.
///
/// Returns `Ok(None)` when the document has no usable `workTitle`.
pub fn extract_work_title(xml: &str) -> Result<Option<String>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;

    let title = doc
        .descendants()
        .filter(|n| n.has_tag_name(META_TAG))
        .find(|n| n.attribute("name") == Some(WORK_TITLE))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(title)
}

/// Read `document` and return its work title.
///
/// `archive` is only used to label the error.
pub async fn read_work_title(archive: &Path, document: &Path) -> Result<Option<String>, ScoreError> {
    let malformed = |detail: String| ScoreError::MalformedDocument {
        path: archive.to_path_buf(),
        detail,
    };

    let xml = tokio::fs::read_to_string(document)
        .await
        .map_err(|e| malformed(format!("{}: {}", document.display(), e)))?;

    tokio::task::spawn_blocking(move || extract_work_title(&xml))
        .await
        .map_err(|e| malformed(format!("parse task panicked: {e}")))?
        .map_err(|e| malformed(e.to_string()))
}

/// The archive's file name without its extension.
pub fn fallback_title(archive: &Path) -> String {
    archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
