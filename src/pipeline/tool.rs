//! External tool invocation with captured exit status.
//!
//! The renderer and typesetter are black boxes. Every call goes through
//! [`ExternalTool::run`], which discards stdout, keeps stderr for
//! diagnostics, and reports the exit status instead of ignoring it. The
//! child is spawned with `kill_on_drop`, so a timed-out or abandoned call
//! does not leave a process behind.

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// How many trailing stderr lines to keep in error messages.
const STDERR_TAIL_LINES: usize = 5;

/// Failure of a single external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("could not start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("'{program}' exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Status and stderr tail of a finished invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub program: String,
    pub status: ExitStatus,
    pub stderr: String,
}

impl ToolOutput {
    /// Turn a non-zero exit into [`ToolError::Failed`].
    pub fn ensure_success(self) -> Result<Self, ToolError> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(ToolError::Failed {
                program: self.program,
                status: self.status,
                stderr: self.stderr,
            })
        }
    }
}

/// A command-line tool with an optional per-call timeout.
///
/// The command is split on whitespace: the first word is the program, the
/// rest are passed before every call's own arguments (`xvfb-run -a mscore`).
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: String,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
}

impl ExternalTool {
    pub fn new(command: &str, timeout_secs: Option<u64>) -> Self {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_default();
        Self {
            program,
            leading_args: words.collect(),
            timeout: timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the tool to completion with `args`.
    ///
    /// A non-zero exit is *not* an error here; call
    /// [`ToolOutput::ensure_success`] when it should be.
    pub async fn run<I, S>(&self, args: I) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {:?}", cmd.as_std());

        let child = cmd.spawn().map_err(|source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ToolError::Timeout {
                    program: self.program.clone(),
                    secs: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        Ok(ToolOutput {
            program: self.program.clone(),
            status: output.status,
            stderr: stderr_tail(&output.stderr),
        })
    }
}

/// Keep the last few non-blank lines of stderr.
fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
