//! Archive extraction into per-score scratch directories.
//!
//! ## Scratch directory lifecycle
//!
//! Each archive is unpacked into `<build_dir>/temp_<stem>`. The name is
//! deterministic so a re-run lands in the same place; any stale directory is
//! cleared first. [`ScratchDir`] owns the directory and removes it on drop,
//! which covers the success, skip and error paths alike. `keep` turns removal
//! off for debugging.
//!
//! Extraction is blocking zip I/O, so it runs inside `spawn_blocking`. The
//! caller awaits it before touching the next score.

use crate::error::ScoreError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A scratch directory removed when dropped (unless kept).
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    keep: bool,
}

impl ScratchDir {
    /// Create (or reset) the scratch directory at `path`.
    pub fn create(path: impl Into<PathBuf>, keep: bool) -> std::io::Result<Self> {
        let path = path.into();
        if path.exists() {
            debug!("Clearing stale scratch directory {}", path.display());
            std::fs::remove_dir_all(&path)?;
        }
        std::fs::create_dir_all(&path)?;
        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(
                "Failed to remove scratch directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Extract every entry of `archive` into `dest`.
pub async fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, ScoreError> {
    let archive_path = archive.to_path_buf();
    let dest_path = dest.to_path_buf();

    tokio::task::spawn_blocking(move || extract_archive_blocking(&archive_path, &dest_path))
        .await
        .map_err(|e| ScoreError::ExtractionFailed {
            path: archive.to_path_buf(),
            detail: format!("extraction task panicked: {e}"),
        })?
}

/// Blocking implementation of archive extraction.
fn extract_archive_blocking(archive: &Path, dest: &Path) -> Result<usize, ScoreError> {
    let failed = |detail: String| ScoreError::ExtractionFailed {
        path: archive.to_path_buf(),
        detail,
    };

    let file = File::open(archive).map_err(|e| failed(e.to_string()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| failed(e.to_string()))?;
    let entries = zip.len();
    zip.extract(dest).map_err(|e| failed(e.to_string()))?;

    debug!(
        "Extracted {} entries from {} into {}",
        entries,
        archive.display(),
        dest.display()
    );
    Ok(entries)
}

/// List the top-level files in `dir` ending in `.<extension>`, sorted by name.
///
/// Subdirectories are not searched.
pub fn find_inner_documents(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let suffix = format!(".{extension}");
    let mut found = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(&suffix) {
            found.push(entry.path());
        }
    }

    found.sort();
    Ok(found)
}
