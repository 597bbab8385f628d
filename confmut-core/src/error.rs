//! Error types for the trial pipeline.
//!
//! [`RunError`] aborts a run (exit code 1). [`TrialError`] is confined to a
//! single trial: it is recorded in the report and the run moves on.

use confmut_codec::CodecError;
use confmut_doc::InvalidPathError;
use confmut_mutate::MutateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    /// The original document could not be loaded.
    #[error("cannot load document: {0:#}")]
    Load(anyhow::Error),

    /// No output could be written at all.
    #[error("cannot write output: {0:#}")]
    Output(anyhow::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no eligible leaves to mutate in {input}")]
    NoTargets { input: String },

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl From<MutateError> for RunError {
    fn from(err: MutateError) -> Self {
        RunError::Config(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TrialError {
    #[error(transparent)]
    InvalidPath(#[from] InvalidPathError),

    #[error(transparent)]
    Mutate(#[from] MutateError),

    #[error("cannot serialize mutated document: {0}")]
    Serialization(#[source] CodecError),

    #[error("cannot write mutated document: {0:#}")]
    Write(anyhow::Error),

    #[error("lint tool could not be invoked: {0}")]
    LintInvocation(String),

    #[error("target command could not be launched: {0}")]
    Execution(String),

    #[error("target command exceeded {after_ms} ms")]
    Timeout { after_ms: u64 },
}

impl TrialError {
    /// Error taxonomy name recorded in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TrialError::InvalidPath(_) => "InvalidPathError",
            TrialError::Mutate(e) => e.kind(),
            TrialError::Serialization(_) => "SerializationError",
            TrialError::Write(_) => "OutputError",
            TrialError::LintInvocation(_) => "LintInvocationError",
            TrialError::Execution(_) => "ExecutionError",
            TrialError::Timeout { .. } => "TimeoutError",
        }
    }
}
