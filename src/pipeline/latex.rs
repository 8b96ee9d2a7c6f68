//! LaTeX generation for the combined book.
//!
//! The document is a thin `article` that pulls in every rendered score with
//! `pdfpages`. Each `\includepdf` carries a `pagecommand` that forces the
//! `plain` page style (centered page number) and adds an unnumbered
//! section-level contents entry, so the contents page lists scores in the
//! order they were included.
//!
//! ```text
//! preamble ─▶ \tableofcontents ─▶ \includepdf × N ─▶ \end{document}
//! ```

use crate::output::RenderedArtifact;
use std::fmt::Write;
use std::path::Path;
use tracing::warn;

/// Document preamble up to and including `\begin{document}`.
///
/// The 80pt footskip keeps the page number below the included score's own
/// footer. `hyperref` comes last; it defines `\phantomsection` and turns
/// contents entries into links.
pub const PREAMBLE: &str = r"\documentclass{article}
\usepackage{pdfpages}
\usepackage{fancyhdr}
\pagestyle{fancy}
\fancyhf{}
\fancyfoot[C]{\thepage}
\setlength{\footskip}{80pt}
\usepackage{tocloft}
\usepackage[hidelinks]{hyperref}
\begin{document}
";

/// Escape the characters LaTeX reserves so `text` typesets literally.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '$' => out.push_str(r"\$"),
            '&' => out.push_str(r"\&"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '%' => out.push_str(r"\%"),
            '^' => out.push_str(r"\^{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            // Line breaks inside a contents entry end the paragraph.
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Characters that change meaning inside the `\includepdf{…}` file argument.
const UNSAFE_PATH_CHARS: &[char] = &['%', '#', '{', '}', '\\', '~', '^', '$', '&'];

/// Path as written into `\includepdf{…}`: forward slashes on every platform.
///
/// Fails for paths that are not UTF-8 or contain a character LaTeX would
/// interpret; such a file cannot be included without corrupting the book.
pub fn latex_path(path: &Path) -> Result<String, String> {
    let text = path
        .to_str()
        .ok_or_else(|| format!("{} is not valid UTF-8", path.display()))?;
    let text = if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text.to_string()
    };
    match text.chars().find(|c| UNSAFE_PATH_CHARS.contains(c)) {
        Some(c) => Err(format!("'{c}' in {text} cannot be passed to \\includepdf")),
        None => Ok(text),
    }
}

/// One `\includepdf` block for `artifact`.
pub fn include_block(artifact: &RenderedArtifact) -> String {
    let mut block = String::new();
    block.push_str("\\includepdf[\n");
    block.push_str("  pages=-,\n");
    block.push_str("  pagecommand={%\n");
    block.push_str("    \\thispagestyle{plain}%\n");
    block.push_str("    \\phantomsection%\n");
    // Writing to a String cannot fail.
    let _ = writeln!(
        block,
        "    \\addcontentsline{{toc}}{{section}}{{\\protect\\numberline{{}}{}}}%",
        escape_latex(&artifact.title)
    );
    block.push_str("  }\n");
    let path = latex_path(&artifact.pdf_path).unwrap_or_else(|detail| {
        warn!("{}; the book will not typeset cleanly", detail);
        artifact.pdf_path.to_string_lossy().into_owned()
    });
    let _ = writeln!(block, "]{{{}}}", path);
    block.push('\n');
    block
}

/// Build the complete LaTeX document for `artifacts`, in order.
pub fn build_markup(artifacts: &[RenderedArtifact]) -> String {
    let mut doc = String::from(PREAMBLE);
    doc.push_str("\\tableofcontents\n");
    for artifact in artifacts {
        doc.push_str(&include_block(artifact));
    }
    doc.push_str("\\end{document}\n");
    doc
}
