//! Configuration types for building a score book.
//!
//! All build behaviour is controlled through [`BookConfig`], built via its
//! [`BookConfigBuilder`]. Paths and tool commands live here rather than in
//! constants so the same binary can be pointed at different score lists,
//! output locations and tool installations.

use crate::error::BookError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for a score book build.
///
/// Built via [`BookConfig::builder()`] or using [`BookConfig::default()`].
///
/// # Example
/// ```rust
/// use scorebook::BookConfig;
///
/// let config = BookConfig::builder()
///     .input_list("choir/autumn.conf")
///     .output_dir("build/pdfs")
///     .renderer("mscore4portable")
///     .build()
///     .unwrap();
/// assert_eq!(config.typeset_passes, 2);
/// ```
#[derive(Clone)]
pub struct BookConfig {
    /// Text file listing one `.mscz` path per line. Default: `scores.conf`.
    pub input_list: PathBuf,

    /// Directory receiving one rendered PDF per score. Default: `build/output_pdfs`.
    pub output_dir: PathBuf,

    /// Directory holding scratch extraction directories and the typesetter
    /// output. Default: `build`.
    pub build_dir: PathBuf,

    /// Path of the generated LaTeX file. Default: `build/scores_book.tex`.
    ///
    /// The final book is `<build_dir>/<markup stem>.pdf`.
    pub markup_file: PathBuf,

    /// Renderer command, invoked as `<renderer> <archive> -o <pdf>`. Default: `mscore`.
    pub renderer: String,

    /// Typesetter command, invoked as
    /// `<typesetter> --output-directory=<build_dir> <markup>`. Default: `pdflatex`.
    pub typesetter: String,

    /// Number of typesetter passes. Default: 2.
    ///
    /// The contents page only learns the final page numbers after the first
    /// pass has laid out every included PDF, so one pass leaves it stale.
    /// Zero skips typesetting and leaves just the `.tex` file.
    pub typeset_passes: u32,

    /// Extension of the score document inside each archive, without the dot.
    /// Default: `mscx`.
    pub inner_extension: String,

    /// Per-invocation timeout for the renderer and typesetter in seconds.
    /// Default: None (wait indefinitely).
    pub tool_timeout_secs: Option<u64>,

    /// Leave scratch directories on disk after each score. Default: false.
    pub keep_scratch: bool,

    /// Treat a non-zero renderer exit or a missing PDF as a skipped score.
    /// Default: true.
    ///
    /// When false the score is recorded even if the renderer failed, and the
    /// typesetter will report the missing file instead.
    pub check_render_status: bool,

    /// What to do when an archive cannot be extracted. Default: [`ExtractionFailurePolicy::Skip`].
    pub extraction_policy: ExtractionFailurePolicy,

    /// Optional progress listener.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            input_list: PathBuf::from("scores.conf"),
            output_dir: PathBuf::from("build/output_pdfs"),
            build_dir: PathBuf::from("build"),
            markup_file: PathBuf::from("build/scores_book.tex"),
            renderer: "mscore".to_string(),
            typesetter: "pdflatex".to_string(),
            typeset_passes: 2,
            inner_extension: "mscx".to_string(),
            tool_timeout_secs: None,
            keep_scratch: false,
            check_render_status: true,
            extraction_policy: ExtractionFailurePolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookConfig")
            .field("input_list", &self.input_list)
            .field("output_dir", &self.output_dir)
            .field("build_dir", &self.build_dir)
            .field("markup_file", &self.markup_file)
            .field("renderer", &self.renderer)
            .field("typesetter", &self.typesetter)
            .field("typeset_passes", &self.typeset_passes)
            .field("inner_extension", &self.inner_extension)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("keep_scratch", &self.keep_scratch)
            .field("check_render_status", &self.check_render_status)
            .field("extraction_policy", &self.extraction_policy)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BuildProgressCallback>"),
            )
            .finish()
    }
}

impl BookConfig {
    /// Create a new builder for `BookConfig`.
    pub fn builder() -> BookConfigBuilder {
        BookConfigBuilder {
            config: Self::default(),
        }
    }

    /// Path of the combined PDF the typesetter writes.
    pub fn book_path(&self) -> PathBuf {
        let stem = self
            .markup_file
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "scores_book".into());
        let mut name = stem;
        name.push(".pdf");
        self.build_dir.join(name)
    }

    /// Scratch directory used for an archive with the given file stem.
    pub fn scratch_dir_for(&self, stem: &str) -> PathBuf {
        self.build_dir.join(format!("temp_{stem}"))
    }

    /// Destination of the rendered PDF for an archive with the given file stem.
    pub fn pdf_path_for(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}.pdf"))
    }
}

/// Builder for [`BookConfig`].
#[derive(Debug)]
pub struct BookConfigBuilder {
    config: BookConfig,
}

impl BookConfigBuilder {
    pub fn input_list(mut self, path: impl AsRef<Path>) -> Self {
        self.config.input_list = path.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn build_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.build_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn markup_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config.markup_file = path.as_ref().to_path_buf();
        self
    }

    pub fn renderer(mut self, cmd: impl Into<String>) -> Self {
        self.config.renderer = cmd.into();
        self
    }

    pub fn typesetter(mut self, cmd: impl Into<String>) -> Self {
        self.config.typesetter = cmd.into();
        self
    }

    pub fn typeset_passes(mut self, n: u32) -> Self {
        self.config.typeset_passes = n;
        self
    }

    pub fn inner_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.inner_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = Some(secs);
        self
    }

    pub fn keep_scratch(mut self, v: bool) -> Self {
        self.config.keep_scratch = v;
        self
    }

    pub fn check_render_status(mut self, v: bool) -> Self {
        self.config.check_render_status = v;
        self
    }

    pub fn extraction_policy(mut self, policy: ExtractionFailurePolicy) -> Self {
        self.config.extraction_policy = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BookConfig, BookError> {
        let c = &self.config;
        if c.renderer.trim().is_empty() {
            return Err(BookError::InvalidConfig(
                "Renderer command must not be empty".into(),
            ));
        }
        if c.typesetter.trim().is_empty() {
            return Err(BookError::InvalidConfig(
                "Typesetter command must not be empty".into(),
            ));
        }
        if c.inner_extension.is_empty() {
            return Err(BookError::InvalidConfig(
                "Inner document extension must not be empty".into(),
            ));
        }
        if c.typeset_passes > 5 {
            return Err(BookError::InvalidConfig(format!(
                "Typesetter passes must be 0–5, got {}",
                c.typeset_passes
            )));
        }
        if c.tool_timeout_secs == Some(0) {
            return Err(BookError::InvalidConfig(
                "Tool timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What to do when an archive is missing, unreadable or corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionFailurePolicy {
    /// Warn and continue with the next score (default).
    #[default]
    Skip,
    /// Stop the whole build with [`BookError::ExtractionAborted`].
    Abort,
}
