//! Per-score processing: archive → (title, rendered PDF).
//!
//! Always returns a [`ScoreResult`], never propagates the error upward, so a
//! single bad archive doesn't abort the entire book. Callers check
//! `result.error` and apply the extraction-failure policy themselves.

use crate::config::BookConfig;
use crate::error::ScoreError;
use crate::output::{RenderedArtifact, ScoreResult};
use crate::pipeline::extract::{self, ScratchDir};
use crate::pipeline::latex;
use crate::pipeline::render;
use crate::pipeline::title;
use crate::pipeline::tool::ExternalTool;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What was found inside an archive before rendering.
#[derive(Debug)]
pub struct ProbedScore {
    /// The work title, if the document carries one.
    pub work_title: Option<String>,
    /// File name of the inner document.
    pub inner_document: String,
}

impl ProbedScore {
    /// Work title, or the archive's file stem.
    pub fn title_or_stem(&self, archive: &Path) -> String {
        self.work_title
            .clone()
            .unwrap_or_else(|| title::fallback_title(archive))
    }
}

/// Extract `source`, find its single inner document and read the title.
///
/// The scratch directory lives only for the duration of this call.
pub async fn probe_score(config: &BookConfig, source: &Path) -> Result<ProbedScore, ScoreError> {
    let stem = title::fallback_title(source);
    let scratch_path = config.scratch_dir_for(&stem);

    let scratch = ScratchDir::create(&scratch_path, config.keep_scratch).map_err(|e| {
        ScoreError::ExtractionFailed {
            path: source.to_path_buf(),
            detail: format!("cannot prepare {}: {}", scratch_path.display(), e),
        }
    })?;

    extract::extract_archive(source, scratch.path()).await?;

    let docs = extract::find_inner_documents(scratch.path(), &config.inner_extension).map_err(
        |e| ScoreError::ExtractionFailed {
            path: source.to_path_buf(),
            detail: format!("cannot list {}: {}", scratch.path().display(), e),
        },
    )?;

    let [document] = docs.as_slice() else {
        return Err(ScoreError::InnerDocumentCount {
            path: source.to_path_buf(),
            extension: config.inner_extension.clone(),
            found: docs.len(),
        });
    };

    let work_title = title::read_work_title(source, document).await?;
    let inner_document = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(
        "{}: inner document {}, work title {:?}",
        source.display(),
        inner_document,
        work_title
    );

    Ok(ProbedScore {
        work_title,
        inner_document,
    })
}

/// Probe and render one archive into a [`RenderedArtifact`].
async fn render_one(
    config: &BookConfig,
    renderer: &ExternalTool,
    source: &Path,
) -> Result<RenderedArtifact, ScoreError> {
    let pdf_path = config.pdf_path_for(&title::fallback_title(source));
    latex::latex_path(&pdf_path).map_err(|detail| ScoreError::UnsupportedPath {
        path: source.to_path_buf(),
        detail,
    })?;

    let probed = probe_score(config, source).await?;
    let title = probed.title_or_stem(source);

    render::render_score(renderer, source, &pdf_path, config.check_render_status).await?;

    Ok(RenderedArtifact {
        title,
        pdf_path,
        source: source.to_path_buf(),
    })
}

/// Process the score at 1-indexed position `index` of `total`.
pub async fn process_score(
    config: &BookConfig,
    renderer: &ExternalTool,
    index: usize,
    total: usize,
    source: PathBuf,
) -> ScoreResult {
    let start = Instant::now();
    info!("Processing [{}/{}]: {}", index, total, source.display());
    if let Some(ref cb) = config.progress_callback {
        cb.on_score_start(index, total, &source);
    }

    let outcome = render_one(config, renderer, &source).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(artifact) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_score_complete(index, total, &artifact.title);
            }
            ScoreResult {
                index,
                source,
                artifact: Some(artifact),
                error: None,
                duration_ms,
            }
        }
        Err(e) => {
            warn!("Skipping {}: {}", source.display(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_score_skipped(index, total, &e.to_string());
            }
            ScoreResult {
                index,
                source,
                artifact: None,
                error: Some(e),
                duration_ms,
            }
        }
    }
}
