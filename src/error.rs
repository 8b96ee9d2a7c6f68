//! Error types for the scorebook library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BookError`]: **Fatal**: the build cannot proceed at all (missing
//!   input list, unwritable output directory, invalid configuration).
//!   Returned as `Err(BookError)` from the top-level `build_*` functions.
//!
//! * [`ScoreError`]: **Non-fatal**: a single archive could not be turned
//!   into a rendered PDF (corrupt zip, wrong number of inner documents,
//!   renderer crash). Stored inside [`crate::output::SkippedScore`] so the
//!   remaining scores still make it into the book.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scorebook library.
///
/// Per-score failures use [`ScoreError`] and are collected in
/// [`crate::output::BookOutput::skipped`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BookError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The score list file was not found.
    #[error("Score list not found: '{path}'\nCheck the path exists and is readable.")]
    InputListNotFound { path: PathBuf },

    /// Process does not have read permission on the score list.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The score list exists but could not be read (not UTF-8, is a directory, …).
    #[error("Failed to read score list '{path}': {source}")]
    InputListRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Score errors ──────────────────────────────────────────────────────
    /// An archive failed to extract and the policy says to stop.
    #[error("Aborting: could not extract '{path}': {detail}")]
    ExtractionAborted { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the PDF output or build directory.
    #[error("Failed to create directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the generated LaTeX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single score archive.
///
/// The build skips the archive and continues with the next entry.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ScoreError {
    /// The archive is missing, unreadable, or not a valid zip.
    #[error("{path}: extraction failed: {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// The archive did not contain exactly one inner score document.
    #[error("{path}: expected one .{extension} file, found {found}")]
    InnerDocumentCount {
        path: PathBuf,
        extension: String,
        found: usize,
    },

    /// The inner score document is not well-formed XML.
    #[error("{path}: malformed score document: {detail}")]
    MalformedDocument { path: PathBuf, detail: String },

    /// The renderer could not be started, exited non-zero, or wrote no PDF.
    #[error("{path}: rendering failed: {detail}")]
    RenderFailed { path: PathBuf, detail: String },

    /// The score's PDF path cannot be written into the LaTeX document.
    #[error("{path}: cannot include in book: {detail}")]
    UnsupportedPath { path: PathBuf, detail: String },

    /// The renderer did not finish within the configured timeout.
    #[error("{path}: renderer timed out after {secs}s")]
    ToolTimeout { path: PathBuf, secs: u64 },
}

impl ScoreError {
    /// The archive this error refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            ScoreError::ExtractionFailed { path, .. }
            | ScoreError::InnerDocumentCount { path, .. }
            | ScoreError::MalformedDocument { path, .. }
            | ScoreError::RenderFailed { path, .. }
            | ScoreError::UnsupportedPath { path, .. }
            | ScoreError::ToolTimeout { path, .. } => path,
        }
    }
}
