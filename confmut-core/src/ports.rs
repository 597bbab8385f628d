//! Port traits abstracting all I/O away from the trial pipeline.

use crate::error::TrialError;
use camino::Utf8Path;
use confmut_codec::LoadedDocument;
use confmut_types::{ExecSignal, LintSignal};

/// Source of the original configuration document.
pub trait DocumentSource {
    fn load(&self) -> anyhow::Result<LoadedDocument>;
}

/// File-system write operations.
pub trait WritePort: Send + Sync {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}

/// Syntactic validation of a written document.
///
/// `Ok` carries [`LintSignal::Passed`] or [`LintSignal::Failed`]. An `Err`
/// means the linter itself could not run.
pub trait Linter: Send + Sync {
    fn lint(&self, path: &Utf8Path) -> Result<LintSignal, TrialError>;
}

/// Runs the target command against a written document.
///
/// An `Err` means the command could not be launched at all.
pub trait CommandRunner: Send + Sync {
    fn run(&self, path: &Utf8Path) -> Result<ExecSignal, TrialError>;
}
