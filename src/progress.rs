//! Progress-callback trait for per-score build events.
//!
//! Inject an [`Arc<dyn BuildProgressCallback>`] via
//! [`crate::config::BookConfigBuilder::progress_callback`] to receive events
//! as the pipeline works through the score list.
//!
//! # Example
//!
//! ```rust
//! use scorebook::{BuildProgressCallback, BookConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     rendered: AtomicUsize,
//! }
//!
//! impl BuildProgressCallback for CountingCallback {
//!     fn on_score_complete(&self, index: usize, total: usize, title: &str) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{}/{}] {}", index, total, title);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { rendered: AtomicUsize::new(0) });
//!
//! let config = BookConfig::builder()
//!     .progress_callback(counter as Arc<dyn BuildProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the build pipeline as it processes each score.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Scores are processed one at a time, but the trait is
/// `Send + Sync` so a callback can be shared with other tasks.
pub trait BuildProgressCallback: Send + Sync {
    /// Called once after the score list has been read.
    fn on_build_start(&self, total_scores: usize) {
        let _ = total_scores;
    }

    /// Called before an archive is extracted.
    ///
    /// # Arguments
    /// * `index` : 1-indexed position in the score list
    /// * `total` : number of scores in the list
    /// * `source`: archive path as written in the list
    fn on_score_start(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called when a score has been rendered and added to the book.
    fn on_score_complete(&self, index: usize, total: usize, title: &str) {
        let _ = (index, total, title);
    }

    /// Called when a score is skipped.
    ///
    /// `reason` is the human-readable [`crate::error::ScoreError`].
    fn on_score_skipped(&self, index: usize, total: usize, reason: &str) {
        let _ = (index, total, reason);
    }

    /// Called before each typesetter pass (1-indexed).
    fn on_typeset_pass(&self, pass: u32, passes: u32) {
        let _ = (pass, passes);
    }

    /// Called once after the book has been assembled.
    fn on_build_complete(&self, total_scores: usize, rendered: usize) {
        let _ = (total_scores, rendered);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BuildProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BookConfig`].
pub type ProgressCallback = Arc<dyn BuildProgressCallback>;
