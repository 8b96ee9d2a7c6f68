//! Eager (whole-book) build entry points.
//!
//! [`build_book`] drains [`crate::stream::render_stream`], writes the LaTeX
//! file and runs the typesetter. Use the stream directly when you want to
//! react to each score as it finishes.

use crate::config::BookConfig;
use crate::error::{BookError, ScoreError};
use crate::output::{BookOutput, BuildStats, RenderedArtifact, ScoreMetadata, SkippedScore};
use crate::pipeline::{latex, score, tool::ExternalTool, typeset};
use crate::stream::render_stream;
use futures::StreamExt;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Build the score book described by `config`.
///
/// # Returns
/// `Ok(BookOutput)` once the LaTeX file is written and every typesetter pass
/// has been attempted, even if some scores were skipped or the typesetter
/// failed (check `output.skipped` and `output.typeset_passes`).
///
/// # Errors
/// Returns `Err(BookError)` only for fatal errors:
/// - score list missing or unreadable
/// - output directory or LaTeX file cannot be written
/// - an archive failed to extract under [`crate::ExtractionFailurePolicy::Abort`]
pub async fn build_book(config: &BookConfig) -> Result<BookOutput, BookError> {
    let total_start = Instant::now();

    // ── Step 1: Read list, stream scores ─────────────────────────────────
    let (total, mut scores) = render_stream(config).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_build_start(total);
    }

    let render_start = Instant::now();
    let mut artifacts: Vec<RenderedArtifact> = Vec::with_capacity(total);
    let mut skipped: Vec<SkippedScore> = Vec::new();

    while let Some(item) = scores.next().await {
        let result = item?;
        match (result.artifact, result.error) {
            (Some(artifact), _) => artifacts.push(artifact),
            (None, Some(error)) => skipped.push(SkippedScore {
                source: result.source,
                error,
            }),
            (None, None) => {
                return Err(BookError::Internal(format!(
                    "score {} produced neither artifact nor error",
                    result.source.display()
                )))
            }
        }
    }
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    if artifacts.is_empty() && total > 0 {
        warn!("No scores were rendered; the book will only contain a contents page");
    }

    // ── Step 2: Write LaTeX ──────────────────────────────────────────────
    let markup = latex::build_markup(&artifacts);
    write_markup(&config.markup_file, &markup)?;
    info!(
        "Wrote {} ({} scores)",
        config.markup_file.display(),
        artifacts.len()
    );

    // ── Step 3: Typeset ──────────────────────────────────────────────────
    tokio::fs::create_dir_all(&config.build_dir)
        .await
        .map_err(|e| BookError::OutputDirFailed {
            path: config.build_dir.clone(),
            source: e,
        })?;

    let typeset_start = Instant::now();
    let typesetter = ExternalTool::new(&config.typesetter, config.tool_timeout_secs);
    let passes = typeset::typeset(
        &typesetter,
        &config.markup_file,
        &config.build_dir,
        config.typeset_passes,
        config.progress_callback.as_ref(),
    )
    .await;
    let typeset_duration_ms = typeset_start.elapsed().as_millis() as u64;

    let stats = BuildStats {
        total_scores: total,
        rendered_scores: artifacts.len(),
        skipped_scores: skipped.len(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        typeset_duration_ms,
    };

    info!(
        "Build complete: {}/{} scores, {}ms total",
        stats.rendered_scores, stats.total_scores, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_build_complete(total, artifacts.len());
    }

    Ok(BookOutput {
        artifacts,
        skipped,
        markup_path: config.markup_file.clone(),
        book_path: config.book_path(),
        typeset_passes: passes,
        stats,
    })
}

/// Synchronous wrapper around [`build_book`].
///
/// Creates a temporary tokio runtime internally.
pub fn build_book_sync(config: &BookConfig) -> Result<BookOutput, BookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BookError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(build_book(config))
}

/// Extract one archive and report its title without rendering.
///
/// Does not require the renderer or typesetter to be installed.
pub async fn inspect_score(
    source: impl AsRef<Path>,
    config: &BookConfig,
) -> Result<ScoreMetadata, ScoreError> {
    let source = source.as_ref();
    let probed = score::probe_score(config, source).await?;
    Ok(ScoreMetadata {
        source: source.to_path_buf(),
        title: probed.title_or_stem(source),
        has_work_title: probed.work_title.is_some(),
        inner_document: probed.inner_document,
    })
}

/// Write `contents` to `path` atomically (temp file in the same directory + rename).
fn write_markup(path: &Path, contents: &str) -> Result<(), BookError> {
    let write_failed = |source: std::io::Error| BookError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_failed)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_failed)?;
    tmp.write_all(contents.as_bytes()).map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}
