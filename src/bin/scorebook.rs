//! CLI binary for scorebook.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BookConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use scorebook::{
    build_book, inspect_score, pipeline::input, BookConfig, BuildProgressCallback,
    ExtractionFailurePolicy, ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar across the score list, one log line
/// per score, and a spinner while the typesetter runs.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Reading score list…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }
}

impl BuildProgressCallback for CliProgressCallback {
    fn on_build_start(&self, total_scores: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} scores  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_scores as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Rendering");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Building book from {total_scores} scores…"))
        ));
    }

    fn on_score_start(&self, _index: usize, _total: usize, source: &Path) {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
    }

    fn on_score_complete(&self, index: usize, total: usize, title: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            title
        ));
        self.bar.inc(1);
    }

    fn on_score_skipped(&self, index: usize, total: usize, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(reason)
        ));
        self.bar.inc(1);
    }

    fn on_typeset_pass(&self, pass: u32, passes: u32) {
        self.bar.set_prefix("Typesetting");
        self.bar.set_message(format!("pass {pass}/{passes}"));
    }

    fn on_build_complete(&self, total_scores: usize, rendered: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        if skipped == 0 {
            eprintln!(
                "{} {} scores rendered",
                green("✔"),
                bold(&rendered.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} scores rendered  ({} skipped)",
                if rendered == 0 { red("✘") } else { cyan("⚠") },
                bold(&rendered.to_string()),
                total_scores,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Build with the defaults (mscore + pdflatex, output under ./build)
  scorebook scores.conf

  # Custom output locations
  scorebook choir.conf -o build/pdfs --markup build/choir.tex

  # Headless server: run MuseScore under a virtual display
  scorebook --renderer "xvfb-run -a mscore" scores.conf

  # Show the title each archive would get, without rendering
  scorebook --inspect-only scores.conf

  # Stop at the first corrupt archive instead of skipping it
  scorebook --abort-on-bad-archive scores.conf

SCORE LIST FORMAT:
  One .mscz path per line. Blank lines and lines starting with '#' are ignored.

OUTPUT STREAMS:
  Progress, skip warnings and logs go to stderr. Stdout carries only the
  --json report and the --inspect-only listing, so either can be piped.

ENVIRONMENT VARIABLES:
  SCOREBOOK_RENDERER     Renderer command (default: mscore)
  SCOREBOOK_TYPESETTER   Typesetter command (default: pdflatex)
  SCOREBOOK_OUTPUT_DIR   Directory for per-score PDFs
  SCOREBOOK_BUILD_DIR    Directory for scratch files and the final book
  RUST_LOG               Override the log filter (e.g. scorebook=debug)
"#;

/// Bundle MuseScore archives into a single PDF book with a table of contents.
#[derive(Parser, Debug)]
#[command(
    name = "scorebook",
    version,
    about = "Bundle MuseScore archives into a single PDF book with a table of contents",
    long_about = "Render every MuseScore archive listed in a text file to PDF and typeset them \
into one document whose table of contents lists each score by its work title.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text file listing one .mscz path per line.
    #[arg(env = "SCOREBOOK_INPUT")]
    input: PathBuf,

    /// Directory for the per-score PDFs.
    #[arg(short, long, env = "SCOREBOOK_OUTPUT_DIR", default_value = "build/output_pdfs")]
    output_dir: PathBuf,

    /// Directory for scratch extraction and the typesetter output.
    #[arg(long, env = "SCOREBOOK_BUILD_DIR", default_value = "build")]
    build_dir: PathBuf,

    /// Path of the generated LaTeX file [default: <build-dir>/scores_book.tex].
    #[arg(long, env = "SCOREBOOK_MARKUP")]
    markup: Option<PathBuf>,

    /// Renderer command; called as `<renderer> <archive> -o <pdf>`.
    #[arg(long, env = "SCOREBOOK_RENDERER", default_value = "mscore")]
    renderer: String,

    /// Typesetter command; called as `<typesetter> --output-directory=<dir> <tex>`.
    #[arg(long, env = "SCOREBOOK_TYPESETTER", default_value = "pdflatex")]
    typesetter: String,

    /// Typesetter passes (0 writes the .tex file only).
    #[arg(long, env = "SCOREBOOK_PASSES", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(0..=5))]
    passes: u32,

    /// Per-call timeout for the renderer and typesetter, in seconds.
    #[arg(long, env = "SCOREBOOK_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Leave the extracted scratch directories on disk.
    #[arg(long, env = "SCOREBOOK_KEEP_SCRATCH")]
    keep_scratch: bool,

    /// Include scores even when the renderer exits non-zero.
    #[arg(long, env = "SCOREBOOK_NO_STATUS_CHECK")]
    no_status_check: bool,

    /// Abort the whole build when an archive cannot be extracted.
    #[arg(long, env = "SCOREBOOK_ABORT_ON_BAD_ARCHIVE")]
    abort_on_bad_archive: bool,

    /// Print the build result as JSON.
    #[arg(long, env = "SCOREBOOK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SCOREBOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Print each archive's title only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCOREBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SCOREBOOK_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = log_filter(cli.verbose, cli.quiet, show_progress);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return inspect_all(&config, cli.json).await;
    }

    // ── Build ────────────────────────────────────────────────────────────
    let output = build_book(&config).await.context("Build failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        // Skips were already logged as warnings when the bar is off.
        if !show_progress {
            eprintln!(
                "Rendered {}/{} scores in {}ms",
                output.stats.rendered_scores,
                output.stats.total_scores,
                output.stats.total_duration_ms
            );
        }

        if config.typeset_passes == 0 {
            eprintln!(
                "{}  {}",
                dim("LaTeX written (typesetting skipped)  →"),
                bold(&output.markup_path.display().to_string())
            );
        } else if output.typeset_ok() {
            eprintln!(
                "{}  {}  →  {}",
                green("✔"),
                dim(&format!("{}ms", output.stats.total_duration_ms)),
                bold(&output.book_path.display().to_string())
            );
        } else {
            let detail = output
                .typeset_passes
                .last()
                .and_then(|p| p.detail.clone())
                .unwrap_or_else(|| "no details".to_string());
            eprintln!(
                "{} Typesetting failed for {}: {}",
                red("✘"),
                output.markup_path.display(),
                detail
            );
        }
    }

    Ok(())
}

/// Default log filter when `RUST_LOG` is unset.
///
/// While the bar is drawn it already prints one line per skipped score, so
/// only the per-score skip warnings are muted; other warnings still show.
fn log_filter(verbose: bool, quiet: bool, show_progress: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else if show_progress {
        "warn,scorebook::pipeline::score=error"
    } else {
        "info"
    }
}

/// Map CLI args to `BookConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BookConfig> {
    let markup = cli
        .markup
        .clone()
        .unwrap_or_else(|| cli.build_dir.join("scores_book.tex"));

    let policy = if cli.abort_on_bad_archive {
        ExtractionFailurePolicy::Abort
    } else {
        ExtractionFailurePolicy::Skip
    };

    let mut builder = BookConfig::builder()
        .input_list(&cli.input)
        .output_dir(&cli.output_dir)
        .build_dir(&cli.build_dir)
        .markup_file(markup)
        .renderer(cli.renderer.clone())
        .typesetter(cli.typesetter.clone())
        .typeset_passes(cli.passes)
        .keep_scratch(cli.keep_scratch)
        .check_render_status(!cli.no_status_check)
        .extraction_policy(policy);

    if let Some(secs) = cli.timeout {
        builder = builder.tool_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Print the title every listed archive would get.
async fn inspect_all(config: &BookConfig, json: bool) -> Result<()> {
    let scores = input::read_score_list(&config.input_list)
        .await
        .context("Failed to read score list")?;

    let mut entries = Vec::with_capacity(scores.len());
    for source in &scores {
        entries.push(inspect_score(source, config).await);
    }

    if json {
        let report: Vec<serde_json::Value> = entries
            .iter()
            .map(|entry| match entry {
                Ok(meta) => serde_json::to_value(meta),
                Err(e) => Ok(serde_json::json!({ "error": e.to_string() })),
            })
            .collect::<Result<_, _>>()
            .context("Failed to serialise metadata")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise metadata")?
        );
        return Ok(());
    }

    for entry in entries {
        match entry {
            Ok(meta) => {
                let origin = if meta.has_work_title {
                    "workTitle"
                } else {
                    "file name"
                };
                println!(
                    "{}  {}  {}",
                    meta.source.display(),
                    bold(&meta.title),
                    dim(&format!("({origin}, {})", meta.inner_document))
                );
            }
            Err(e) => println!("{} {}", red("✗"), e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_keeps_non_skip_warnings() {
        let filter = log_filter(false, false, true);
        assert!(filter.starts_with("warn"));
        assert!(filter.contains("scorebook::pipeline::score=error"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }

    #[test]
    fn verbose_wins_over_quiet_and_progress() {
        assert_eq!(log_filter(true, true, true), "debug");
        assert_eq!(log_filter(false, true, false), "error");
        assert_eq!(log_filter(false, false, false), "info");
    }
}
