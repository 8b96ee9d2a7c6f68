//! Result types returned by a score book build.

use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One score that was rendered and will appear in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    /// Table-of-contents label: the `workTitle` tag, or the archive's file stem.
    pub title: String,
    /// Rendered PDF written by the renderer.
    pub pdf_path: PathBuf,
    /// Archive the PDF was rendered from.
    pub source: PathBuf,
}

/// A score that produced no artifact, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedScore {
    pub source: PathBuf,
    pub error: ScoreError,
}

/// Outcome of processing a single score.
///
/// Exactly one of `artifact` / `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 1-indexed position in the score list.
    pub index: usize,
    pub source: PathBuf,
    pub artifact: Option<RenderedArtifact>,
    pub error: Option<ScoreError>,
    /// Wall-clock time spent on this score (extract + parse + render).
    pub duration_ms: u64,
}

/// Exit status of one typesetter pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesetPass {
    /// 1-indexed pass number.
    pub pass: u32,
    /// Process exit code; None when it was killed by a signal, timed out or
    /// never started.
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Last lines of stderr, or the spawn/timeout error.
    pub detail: Option<String>,
}

/// Aggregate timing and counts for a build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStats {
    /// Entries in the score list.
    pub total_scores: usize,
    pub rendered_scores: usize,
    pub skipped_scores: usize,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
    pub typeset_duration_ms: u64,
}

/// Everything a completed build produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOutput {
    /// Rendered scores in score-list order; this is also the contents order.
    pub artifacts: Vec<RenderedArtifact>,
    /// Scores that were skipped, in score-list order.
    pub skipped: Vec<SkippedScore>,
    /// The generated LaTeX file.
    pub markup_path: PathBuf,
    /// Where the typesetter writes the combined PDF.
    pub book_path: PathBuf,
    /// One entry per typesetter pass that was attempted.
    pub typeset_passes: Vec<TypesetPass>,
    pub stats: BuildStats,
}

impl BookOutput {
    /// True when the last typesetter pass succeeded.
    pub fn typeset_ok(&self) -> bool {
        self.typeset_passes.last().is_some_and(|p| p.success)
    }
}

/// Title and inner document discovered in an archive, without rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreMetadata {
    pub source: PathBuf,
    pub title: String,
    /// True when `title` came from the `workTitle` tag rather than the file stem.
    pub has_work_title: bool,
    /// File name of the inner score document.
    pub inner_document: String,
}
