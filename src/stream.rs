//! Streaming API: emit one score outcome at a time.
//!
//! Unlike the eager [`crate::build::build_book`], which returns only after
//! the book has been typeset, [`render_stream`] yields a [`ScoreResult`] as
//! each archive finishes rendering. Scores are processed strictly in list
//! order and one at a time; the next archive is not touched until the
//! caller polls for it.
//!
//! The stream ends early with a single `Err(BookError::ExtractionAborted)`
//! item when an archive cannot be extracted under
//! [`ExtractionFailurePolicy::Abort`].

use crate::config::{BookConfig, ExtractionFailurePolicy};
use crate::error::{BookError, ScoreError};
use crate::output::ScoreResult;
use crate::pipeline::{input, score, tool::ExternalTool};
use futures::{stream, Stream};
use std::path::PathBuf;
use std::pin::Pin;
use tracing::info;

/// A boxed stream of per-score outcomes.
pub type ScoreStream = Pin<Box<dyn Stream<Item = Result<ScoreResult, BookError>> + Send>>;

struct StreamState {
    scores: std::iter::Enumerate<std::vec::IntoIter<PathBuf>>,
    total: usize,
    config: BookConfig,
    renderer: ExternalTool,
    halted: bool,
}

/// Read the score list and stream rendered scores.
///
/// # Returns
/// - `Ok((total, ScoreStream))`: number of listed scores and the stream
/// - `Err(BookError)`: the list could not be read or the output directory
///   could not be created
pub async fn render_stream(config: &BookConfig) -> Result<(usize, ScoreStream), BookError> {
    let scores = input::read_score_list(&config.input_list).await?;
    let total = scores.len();
    info!(
        "Starting score book build: {} scores from {}",
        total,
        config.input_list.display()
    );

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| BookError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    Ok((total, stream_scores(scores, config)))
}

/// Stream the given archives without reading a score list.
pub fn stream_scores(scores: Vec<PathBuf>, config: &BookConfig) -> ScoreStream {
    let state = StreamState {
        total: scores.len(),
        scores: scores.into_iter().enumerate(),
        renderer: ExternalTool::new(&config.renderer, config.tool_timeout_secs),
        config: config.clone(),
        halted: false,
    };

    let s = stream::unfold(state, |mut st| async move {
        if st.halted {
            return None;
        }
        let (i, source) = st.scores.next()?;
        let result = score::process_score(&st.config, &st.renderer, i + 1, st.total, source).await;

        let item = match (&result.error, st.config.extraction_policy) {
            (Some(ScoreError::ExtractionFailed { path, detail }), ExtractionFailurePolicy::Abort) => {
                st.halted = true;
                Err(BookError::ExtractionAborted {
                    path: path.clone(),
                    detail: detail.clone(),
                })
            }
            _ => Ok(result),
        };
        Some((item, st))
    });

    Box::pin(s)
}
