//! # scorebook
//!
//! Bundle a list of MuseScore archives (`.mscz`) into one PDF songbook with a
//! clickable table of contents.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scores.conf
//!  │
//!  ├─ 1. Input    read archive paths, one per line
//!  ├─ 2. Extract  unzip each archive into a scoped scratch directory
//!  ├─ 3. Title    read <metaTag name="workTitle">, else the file stem
//!  ├─ 4. Render   mscore <archive> -o <output_dir>/<stem>.pdf
//!  ├─ 5. Markup   pdfpages LaTeX with one contents entry per score
//!  └─ 6. Typeset  pdflatex, twice, so contents page numbers resolve
//! ```
//!
//! Scores are processed one at a time, in list order. An archive that is
//! corrupt, holds zero or several `.mscx` documents, or fails to render is
//! skipped with a warning; the rest of the book is still built.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scorebook::{build_book, BookConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BookConfig::builder()
//!         .input_list("scores.conf")
//!         .output_dir("build/output_pdfs")
//!         .build()?;
//!     let output = build_book(&config).await?;
//!     for skipped in &output.skipped {
//!         eprintln!("skipped: {}", skipped.error);
//!     }
//!     println!("{}", output.book_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scorebook` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod build;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use build::{build_book, build_book_sync, inspect_score};
pub use config::{BookConfig, BookConfigBuilder, ExtractionFailurePolicy};
pub use error::{BookError, ScoreError};
pub use output::{
    BookOutput, BuildStats, RenderedArtifact, ScoreMetadata, ScoreResult, SkippedScore,
    TypesetPass,
};
pub use progress::{BuildProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{render_stream, stream_scores, ScoreStream};
