//! Score rendering: archive → PDF via the external renderer.
//!
//! The renderer reads the `.mscz` archive directly (not the extracted
//! document) and is invoked as `<renderer> <archive> -o <pdf>`.

use crate::error::ScoreError;
use crate::pipeline::tool::{ExternalTool, ToolError, ToolOutput};
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Render `archive` to `pdf_path`.
///
/// Any PDF already at `pdf_path` is removed first. With `check_status` the
/// call fails on spawn errors, timeouts, non-zero exit and a missing output
/// file. Without it the renderer's outcome is
/// logged and ignored.
pub async fn render_score(
    renderer: &ExternalTool,
    archive: &Path,
    pdf_path: &Path,
    check_status: bool,
) -> Result<(), ScoreError> {
    // The output check below only means something if no earlier PDF is left.
    match tokio::fs::remove_file(pdf_path).await {
        Ok(()) => debug!("Removed stale {}", pdf_path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(ScoreError::RenderFailed {
                path: archive.to_path_buf(),
                detail: format!("cannot remove stale {}: {}", pdf_path.display(), e),
            })
        }
    }

    let args = [archive.as_os_str(), OsStr::new("-o"), pdf_path.as_os_str()];

    let result = renderer
        .run(args)
        .await
        .and_then(ToolOutput::ensure_success)
        .map(|_| ());

    let result = result.map_err(|e| match e {
        ToolError::Timeout { secs, .. } => ScoreError::ToolTimeout {
            path: archive.to_path_buf(),
            secs,
        },
        other => ScoreError::RenderFailed {
            path: archive.to_path_buf(),
            detail: other.to_string(),
        },
    });

    let result = result.and_then(|()| {
        if pdf_path.is_file() {
            Ok(())
        } else {
            Err(ScoreError::RenderFailed {
                path: archive.to_path_buf(),
                detail: format!("'{}' wrote no {}", renderer.program(), pdf_path.display()),
            })
        }
    });

    match result {
        Ok(()) => {
            debug!("Rendered {} → {}", archive.display(), pdf_path.display());
            Ok(())
        }
        Err(e) if !check_status => {
            warn!("Ignoring renderer failure: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}
