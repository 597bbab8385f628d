//! Default port implementations: filesystem, in-memory, and process-backed.

use crate::error::TrialError;
use crate::ports::{CommandRunner, DocumentSource, Linter, WritePort};
use crate::process::{self, Termination};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use confmut_codec::{CodecError, Format, LoadedDocument};
use confmut_types::{ExecSignal, ExecStatus, LintSignal};
use fs_err as fs;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Loads the document from disk via `confmut_codec::load`.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    pub path: Utf8PathBuf,
}

impl FsDocumentSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl DocumentSource for FsDocumentSource {
    fn load(&self) -> anyhow::Result<LoadedDocument> {
        confmut_codec::load(&self.path).with_context(|| format!("load {}", self.path))
    }
}

/// Parses a document from text held in memory, for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentSource {
    path: Utf8PathBuf,
    text: String,
}

impl InMemoryDocumentSource {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

impl DocumentSource for InMemoryDocumentSource {
    fn load(&self) -> anyhow::Result<LoadedDocument> {
        let format = Format::from_path(&self.path)?;
        let document = confmut_codec::parse(format, &self.text)
            .with_context(|| format!("parse {}", self.path))?;
        Ok(LoadedDocument {
            path: self.path.clone(),
            format,
            source: self.text.clone(),
            document,
        })
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

/// Collects writes in memory.
#[derive(Debug, Default)]
pub struct InMemoryWritePort {
    files: Mutex<BTreeMap<Utf8PathBuf, Vec<u8>>>,
}

impl InMemoryWritePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last bytes written to `path`.
    pub fn contents(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        self.files.lock().ok()?.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<Utf8PathBuf> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl WritePort for InMemoryWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory store poisoned"))?;
        files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Builtin lint: the written file must parse back in its own format.
#[derive(Debug, Clone, Copy)]
pub struct ParseBackLinter {
    pub format: Format,
}

impl Linter for ParseBackLinter {
    fn lint(&self, path: &Utf8Path) -> Result<LintSignal, TrialError> {
        let text =
            fs::read_to_string(path).map_err(|e| TrialError::LintInvocation(e.to_string()))?;
        match confmut_codec::parse(self.format, &text) {
            Ok(_) => Ok(LintSignal::Passed),
            Err(CodecError::Io(e)) => Err(TrialError::LintInvocation(e.to_string())),
            Err(e) => Ok(LintSignal::Failed {
                diagnostics: e.to_string(),
            }),
        }
    }
}

/// External lint tool run through the shell.
///
/// Exit 0 passes, 126/127 mean the tool is missing or not executable,
/// anything else is a lint failure with the tool's output as diagnostics.
#[derive(Debug, Clone)]
pub struct CommandLinter {
    pub template: String,
    pub timeout: Duration,
    pub output_limit: usize,
}

impl Linter for CommandLinter {
    fn lint(&self, path: &Utf8Path) -> Result<LintSignal, TrialError> {
        let command = process::expand_template(&self.template, path);
        let out = process::run_shell(&command, path, self.timeout, self.output_limit)
            .map_err(|e| TrialError::LintInvocation(format!("{command}: {e}")))?;
        debug!(command = %command, termination = ?out.termination, "lint finished");
        match out.termination {
            Termination::Exited(0) => Ok(LintSignal::Passed),
            Termination::Exited(code @ (126 | 127)) => Err(TrialError::LintInvocation(format!(
                "{command}: exit {code}: {}",
                out.stderr.trim()
            ))),
            Termination::TimedOut => Err(TrialError::LintInvocation(format!(
                "{command}: timed out after {} ms",
                self.timeout.as_millis()
            ))),
            Termination::Exited(_) | Termination::Signaled(_) => Ok(LintSignal::Failed {
                diagnostics: join_output(&out.stdout, &out.stderr),
            }),
        }
    }
}

fn join_output(stdout: &str, stderr: &str) -> String {
    match (stdout.trim(), stderr.trim()) {
        ("", err) => err.to_string(),
        (out, "") => out.to_string(),
        (out, err) => format!("{out}\n{err}"),
    }
}

/// Target command run through `sh -c` with a hard timeout.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    pub template: String,
    pub timeout: Duration,
    pub output_limit: usize,
}

impl ShellCommandRunner {
    pub fn new(template: impl Into<String>, timeout: Duration, output_limit: usize) -> Self {
        Self {
            template: template.into(),
            timeout,
            output_limit,
        }
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, path: &Utf8Path) -> Result<ExecSignal, TrialError> {
        let command = process::expand_template(&self.template, path);
        let out = process::run_shell(&command, path, self.timeout, self.output_limit)
            .map_err(|e| TrialError::Execution(format!("{command}: {e}")))?;
        let status = match out.termination {
            Termination::Exited(code) => ExecStatus::Exited { code },
            Termination::Signaled(signal) => ExecStatus::Signaled { signal },
            Termination::TimedOut => ExecStatus::TimedOut {
                after_ms: self.timeout.as_millis() as u64,
            },
        };
        Ok(ExecSignal {
            status,
            stdout: out.stdout,
            stderr: out.stderr,
            duration_ms: out.elapsed.as_millis() as u64,
        })
    }
}
