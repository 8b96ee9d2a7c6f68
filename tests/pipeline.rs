//! End-to-end tests for the scorebook pipeline.
//!
//! Real `.mscz` archives are built on the fly with `zip::ZipWriter`; the
//! renderer and typesetter are small `sh` scripts that record how they were
//! called, so the tests need neither MuseScore nor a TeX installation.

#![cfg(unix)]

use futures::StreamExt;
use scorebook::{
    build_book, inspect_score, stream_scores, BookConfig, BookError, ExtractionFailurePolicy,
    ScoreError,
};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("scorebook=debug"))
        .with_test_writer()
        .try_init();
}

fn mscx(work_title: Option<&str>) -> String {
    let tag = work_title
        .map(|t| format!(r#"<metaTag name="workTitle">{t}</metaTag>"#))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<museScore version="4.20">
  <Score>
    <metaTag name="composer">Anon.</metaTag>
    {tag}
  </Score>
</museScore>
"#
    )
}

fn write_archive(path: &Path, entries: &[(&str, String)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, body) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// A sandbox with fake tools and a score directory.
struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        init_tracing();
        let ws = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir_all(ws.path("scores")).unwrap();

        // Renderer: log the call, write a stand-in PDF to the -o target.
        ws.script(
            "render.sh",
            &format!(
                r#"echo "$1 $2 $3" >> "{}"
printf '%%PDF-1.4\n' > "$3""#,
                ws.path("render.log").display()
            ),
        );
        // Typesetter: log the call, produce <stem>.pdf in the output directory.
        ws.script(
            "tex.sh",
            &format!(
                r#"echo "$1 $2" >> "{}"
out="${{1#--output-directory=}}"
stem=$(basename "$2" .tex)
printf '%%PDF-1.4\n' > "$out/$stem.pdf""#,
                ws.path("tex.log").display()
            ),
        );
        ws
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn script(&self, name: &str, body: &str) {
        std::fs::write(self.path(name), format!("{body}\n")).unwrap();
    }

    fn score(&self, name: &str, entries: &[(&str, String)]) -> PathBuf {
        let path = self.path("scores").join(name);
        write_archive(&path, entries);
        path
    }

    fn list(&self, scores: &[PathBuf]) -> PathBuf {
        let text: String = scores
            .iter()
            .map(|p| format!("{}\n\n", p.display()))
            .collect();
        let path = self.path("scores.conf");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn config(&self, list: &Path) -> BookConfig {
        BookConfig::builder()
            .input_list(list)
            .output_dir(self.path("build/output_pdfs"))
            .build_dir(self.path("build"))
            .markup_file(self.path("build/scores_book.tex"))
            .renderer(format!("sh {}", self.path("render.sh").display()))
            .typesetter(format!("sh {}", self.path("tex.sh").display()))
            .build()
            .unwrap()
    }

    fn log_lines(&self, name: &str) -> Vec<String> {
        std::fs::read_to_string(self.path(name))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_scores_with_and_without_title() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("Sonata No.1")))]);
    let b = ws.score("b.mscz", &[("b.mscx", mscx(None))]);
    let config = ws.config(&ws.list(&[a.clone(), b.clone()]));

    let output = build_book(&config).await.unwrap();

    // Rendered PDFs
    assert!(ws.path("build/output_pdfs/a.pdf").is_file());
    assert!(ws.path("build/output_pdfs/b.pdf").is_file());
    assert_eq!(
        ws.log_lines("render.log"),
        vec![
            format!("{} -o {}", a.display(), ws.path("build/output_pdfs/a.pdf").display()),
            format!("{} -o {}", b.display(), ws.path("build/output_pdfs/b.pdf").display()),
        ]
    );

    // Artifacts in list order
    let titles: Vec<&str> = output.artifacts.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Sonata No.1", "b"]);
    assert!(output.skipped.is_empty());

    // Markup: two blocks, in order
    let tex = std::fs::read_to_string(&output.markup_path).unwrap();
    assert_eq!(tex.matches("\\includepdf[").count(), 2);
    let first = tex.find("\\numberline{}Sonata No.1}").unwrap();
    let second = tex.find("\\numberline{}b}").unwrap();
    assert!(first < second);

    // Two typesetter passes over the markup file
    let expected = format!(
        "--output-directory={} {}",
        ws.path("build").display(),
        ws.path("build/scores_book.tex").display()
    );
    assert_eq!(ws.log_lines("tex.log"), vec![expected.clone(), expected]);
    assert_eq!(output.typeset_passes.len(), 2);
    assert!(output.typeset_ok());
    assert_eq!(output.book_path, ws.path("build/scores_book.pdf"));
    assert!(output.book_path.is_file());

    assert_eq!(output.stats.total_scores, 2);
    assert_eq!(output.stats.rendered_scores, 2);
}

#[tokio::test]
async fn archive_with_two_documents_is_skipped() {
    let ws = Workspace::new();
    let duet = ws.score(
        "duet.mscz",
        &[("one.mscx", mscx(Some("One"))), ("two.mscx", mscx(Some("Two")))],
    );
    let solo = ws.score("solo.mscz", &[("solo.mscx", mscx(Some("Solo")))]);
    let config = ws.config(&ws.list(&[duet.clone(), solo]));

    let output = build_book(&config).await.unwrap();

    assert_eq!(output.artifacts.len(), 1);
    assert_eq!(output.artifacts[0].title, "Solo");
    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].source, duet);
    match &output.skipped[0].error {
        ScoreError::InnerDocumentCount { found, path, .. } => {
            assert_eq!(*found, 2);
            assert_eq!(path, &duet);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(output.skipped[0].error.to_string().contains("found 2"));
    assert!(!ws.path("build/output_pdfs/duet.pdf").exists());
    assert_eq!(ws.log_lines("render.log").len(), 1);
}

#[tokio::test]
async fn archive_without_document_is_skipped() {
    let ws = Workspace::new();
    let empty = ws.score("empty.mscz", &[("thumbnail.png", String::new())]);
    let config = ws.config(&ws.list(&[empty]));

    let output = build_book(&config).await.unwrap();

    assert!(output.artifacts.is_empty());
    assert!(matches!(
        output.skipped[0].error,
        ScoreError::InnerDocumentCount { found: 0, .. }
    ));
    let tex = std::fs::read_to_string(&output.markup_path).unwrap();
    assert!(tex.contains("\\tableofcontents"));
    assert!(!tex.contains("\\includepdf"));
}

#[tokio::test]
async fn corrupt_archive_is_skipped_by_default() {
    let ws = Workspace::new();
    let bad = ws.path("scores/bad.mscz");
    std::fs::write(&bad, b"not a zip").unwrap();
    let missing = ws.path("scores/missing.mscz");
    let good = ws.score("good.mscz", &[("good.mscx", mscx(Some("Good")))]);
    let config = ws.config(&ws.list(&[bad, missing, good]));

    let output = build_book(&config).await.unwrap();

    assert_eq!(output.artifacts.len(), 1);
    assert_eq!(output.artifacts[0].title, "Good");
    assert_eq!(output.skipped.len(), 2);
    assert!(output
        .skipped
        .iter()
        .all(|s| matches!(s.error, ScoreError::ExtractionFailed { .. })));
}

#[tokio::test]
async fn corrupt_archive_aborts_under_abort_policy() {
    let ws = Workspace::new();
    let bad = ws.path("scores/bad.mscz");
    std::fs::write(&bad, b"not a zip").unwrap();
    let good = ws.score("good.mscz", &[("good.mscx", mscx(Some("Good")))]);
    let mut config = ws.config(&ws.list(&[bad, good]));
    config.extraction_policy = ExtractionFailurePolicy::Abort;

    let err = build_book(&config).await.unwrap_err();

    assert!(matches!(err, BookError::ExtractionAborted { .. }));
    assert!(ws.log_lines("render.log").is_empty());
    assert!(!ws.path("build/scores_book.tex").exists());
}

#[tokio::test]
async fn renderer_failure_skips_score() {
    let ws = Workspace::new();
    ws.script("render.sh", "echo 'segfault' >&2; exit 139");
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("A")))]);
    let config = ws.config(&ws.list(&[a]));

    let output = build_book(&config).await.unwrap();

    assert!(output.artifacts.is_empty());
    let msg = output.skipped[0].error.to_string();
    assert!(msg.contains("rendering failed"), "got: {msg}");
    assert!(msg.contains("segfault"), "got: {msg}");
}

#[tokio::test]
async fn renderer_failure_recorded_without_status_check() {
    let ws = Workspace::new();
    ws.script("render.sh", "exit 1");
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("A")))]);
    let mut config = ws.config(&ws.list(&[a]));
    config.check_render_status = false;

    let output = build_book(&config).await.unwrap();

    assert_eq!(output.artifacts.len(), 1);
    assert!(!output.artifacts[0].pdf_path.exists());
}

#[tokio::test]
async fn rerun_with_silent_renderer_skips_instead_of_reusing_old_pdf() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("A")))]);
    let config = ws.config(&ws.list(&[a]));

    let first = build_book(&config).await.unwrap();
    assert_eq!(first.artifacts.len(), 1);
    let old_pdf = first.artifacts[0].pdf_path.clone();
    assert!(old_pdf.is_file());

    // Exits cleanly but never writes the requested PDF.
    ws.script("render.sh", "exit 0");
    let second = build_book(&config).await.unwrap();

    assert!(second.artifacts.is_empty());
    assert_eq!(second.skipped.len(), 1);
    let msg = second.skipped[0].error.to_string();
    assert!(msg.contains("wrote no"), "got: {msg}");
    assert!(!old_pdf.exists());
    let tex = std::fs::read_to_string(&second.markup_path).unwrap();
    assert!(!tex.contains("\\includepdf["));
}

#[tokio::test]
async fn file_name_that_breaks_includepdf_is_skipped_before_rendering() {
    let ws = Workspace::new();
    let bad = ws.score("100%.mscz", &[("x.mscx", mscx(Some("Hundred")))]);
    let good = ws.score("b.mscz", &[("b.mscx", mscx(Some("B")))]);
    let config = ws.config(&ws.list(&[bad, good]));

    let output = build_book(&config).await.unwrap();

    assert_eq!(output.artifacts.len(), 1);
    assert_eq!(output.artifacts[0].title, "B");
    assert!(matches!(
        output.skipped[0].error,
        ScoreError::UnsupportedPath { .. }
    ));
    let calls = std::fs::read_to_string(ws.path("render.log")).unwrap();
    assert_eq!(calls.lines().count(), 1);
    assert!(!calls.contains("100%"));
}

#[tokio::test]
async fn typesetter_failure_is_not_fatal() {
    let ws = Workspace::new();
    ws.script("tex.sh", "echo '! Emergency stop.' >&2; exit 1");
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("A")))]);
    let config = ws.config(&ws.list(&[a]));

    let output = build_book(&config).await.unwrap();

    assert_eq!(output.artifacts.len(), 1);
    assert_eq!(output.typeset_passes.len(), 2);
    assert!(!output.typeset_ok());
    assert!(output.typeset_passes[1]
        .detail
        .as_deref()
        .unwrap()
        .contains("Emergency stop"));
}

#[tokio::test]
async fn special_characters_in_title_are_escaped() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("Rock &amp; Roll 100%")))]);
    let config = ws.config(&ws.list(&[a]));

    let output = build_book(&config).await.unwrap();

    assert_eq!(output.artifacts[0].title, "Rock & Roll 100%");
    let tex = std::fs::read_to_string(&output.markup_path).unwrap();
    assert!(tex.contains(r"\numberline{}Rock \& Roll 100\%}"));
}

#[tokio::test]
async fn rerun_produces_same_book_and_cleans_scratch() {
    let ws = Workspace::new();
    let scores: Vec<PathBuf> = ["x", "y", "z"]
        .iter()
        .map(|n| ws.score(&format!("{n}.mscz"), &[(format!("{n}.mscx").as_str(), mscx(None))]))
        .collect();
    let config = ws.config(&ws.list(&scores));

    let first = build_book(&config).await.unwrap();
    let second = build_book(&config).await.unwrap();

    let tex = std::fs::read_to_string(&second.markup_path).unwrap();
    assert_eq!(tex.matches("\\includepdf[").count(), 3);
    let paths: BTreeSet<_> = second.artifacts.iter().map(|a| &a.pdf_path).collect();
    assert_eq!(paths.len(), 3);
    assert_eq!(first.artifacts, second.artifacts);

    for n in ["x", "y", "z"] {
        assert!(!ws.path(&format!("build/temp_{n}")).exists());
    }
}

#[tokio::test]
async fn keep_scratch_leaves_extracted_files() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(None))]);
    let mut config = ws.config(&ws.list(&[a]));
    config.keep_scratch = true;

    build_book(&config).await.unwrap();

    assert!(ws.path("build/temp_a/a.mscx").is_file());
}

#[tokio::test]
async fn zero_passes_writes_markup_only() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(None))]);
    let mut config = ws.config(&ws.list(&[a]));
    config.typeset_passes = 0;

    let output = build_book(&config).await.unwrap();

    assert!(output.markup_path.is_file());
    assert!(output.typeset_passes.is_empty());
    assert!(ws.log_lines("tex.log").is_empty());
}

#[tokio::test]
async fn stream_yields_results_in_list_order() {
    let ws = Workspace::new();
    let scores = vec![
        ws.score("c.mscz", &[("c.mscx", mscx(Some("Third")))]),
        ws.score("a.mscz", &[("a.mscx", mscx(Some("First")))]),
        ws.score("b.mscz", &[]),
    ];
    std::fs::create_dir_all(ws.path("build/output_pdfs")).unwrap();
    let config = ws.config(&ws.list(&scores));

    let results: Vec<_> = stream_scores(scores.clone(), &config).collect().await;

    assert_eq!(results.len(), 3);
    let results: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(results[0].index, 1);
    assert_eq!(results[0].artifact.as_ref().unwrap().title, "Third");
    assert_eq!(results[1].artifact.as_ref().unwrap().title, "First");
    assert!(results[2].error.is_some());
    assert_eq!(results[2].source, scores[2]);
}

#[tokio::test]
async fn inspect_reports_title_without_rendering() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("Sonata No.1")))]);
    let b = ws.score("b.mscz", &[("b.mscx", mscx(None))]);
    let config = ws.config(&ws.list(&[a.clone(), b.clone()]));

    let meta_a = inspect_score(&a, &config).await.unwrap();
    let meta_b = inspect_score(&b, &config).await.unwrap();

    assert_eq!(meta_a.title, "Sonata No.1");
    assert!(meta_a.has_work_title);
    assert_eq!(meta_a.inner_document, "a.mscx");
    assert_eq!(meta_b.title, "b");
    assert!(!meta_b.has_work_title);
    assert!(ws.log_lines("render.log").is_empty());
}

#[test]
fn sync_wrapper_builds_book() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("Kyrie")))]);
    let config = ws.config(&ws.list(&[a]));

    let output = scorebook::build_book_sync(&config).unwrap();

    assert_eq!(output.artifacts[0].title, "Kyrie");
}

#[tokio::test]
async fn output_serialises_to_json() {
    let ws = Workspace::new();
    let a = ws.score("a.mscz", &[("a.mscx", mscx(Some("Gloria")))]);
    let config = ws.config(&ws.list(&[a]));

    let output = build_book(&config).await.unwrap();
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["artifacts"][0]["title"], "Gloria");
    assert_eq!(json["stats"]["rendered_scores"], 1);
}
