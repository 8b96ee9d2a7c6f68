//! Typesetting: run the LaTeX engine over the generated book.
//!
//! The engine runs `passes` times in a row. The first pass writes the `.toc`
//! file, the second reads it back with final page numbers. A failing pass is
//! reported in its [`TypesetPass`] and logged; it never aborts the build.

use crate::output::TypesetPass;
use crate::pipeline::tool::{ExternalTool, ToolError};
use crate::progress::ProgressCallback;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};

/// Run `<typesetter> --output-directory=<out_dir> <markup>` `passes` times.
pub async fn typeset(
    typesetter: &ExternalTool,
    markup: &Path,
    out_dir: &Path,
    passes: u32,
    progress: Option<&ProgressCallback>,
) -> Vec<TypesetPass> {
    let output_flag = format!("--output-directory={}", out_dir.display());
    let mut reports = Vec::with_capacity(passes as usize);

    for pass in 1..=passes {
        if let Some(cb) = progress {
            cb.on_typeset_pass(pass, passes);
        }
        info!("Typesetting pass {}/{}", pass, passes);

        let args = [OsStr::new(&output_flag), markup.as_os_str()];
        let mut engine_missing = false;
        let report = match typesetter.run(args).await {
            Ok(out) => TypesetPass {
                pass,
                exit_code: out.status.code(),
                success: out.status.success(),
                detail: (!out.status.success() && !out.stderr.is_empty())
                    .then(|| out.stderr.clone()),
            },
            Err(e) => {
                engine_missing = matches!(e, ToolError::Spawn { .. });
                TypesetPass {
                    pass,
                    exit_code: None,
                    success: false,
                    detail: Some(e.to_string()),
                }
            }
        };

        if !report.success {
            warn!(
                "Typesetter pass {}/{} failed (exit {:?}){}",
                pass,
                passes,
                report.exit_code,
                report
                    .detail
                    .as_deref()
                    .map(|d| format!(": {d}"))
                    .unwrap_or_default()
            );
        }

        reports.push(report);
        // A missing engine fails identically on every pass.
        if engine_missing {
            break;
        }
    }

    reports
}
