use crate::boundary::{Boundary, BoundarySource};
use crate::path::LeafPath;
use crate::scalar::{Scalar, TypeTag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One leaf replacement made during a trial. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub trial: u32,
    pub path: LeafPath,
    pub original: Scalar,
    pub mutated: Scalar,
    pub tag: TypeTag,
    pub boundary: Boundary,
    pub boundary_source: BoundarySource,

    /// Name of the string corruption strategy, when one was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LintSignal {
    Skipped,
    Passed,
    Failed { diagnostics: String },
    /// The lint tool itself could not be invoked.
    Unavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecStatus {
    /// No target command configured for the run.
    NotConfigured,
    /// Command configured but skipped (lint failed first).
    NotRun,
    Exited { code: i32 },
    Signaled { signal: i32 },
    TimedOut { after_ms: u64 },
    SpawnFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecSignal {
    pub status: ExecStatus,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,

    pub duration_ms: u64,
}

impl ExecSignal {
    pub fn without_output(status: ExecStatus) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }
}

/// Raw signals observed for a trial, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSignals {
    pub lint: LintSignal,
    pub exec: ExecSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCategory {
    Tolerated,
    RejectedGracefully,
    Crashed,
    TimedOut,
    ExecutionError,
}

impl OutcomeCategory {
    pub const ALL: [OutcomeCategory; 5] = [
        OutcomeCategory::Tolerated,
        OutcomeCategory::RejectedGracefully,
        OutcomeCategory::Crashed,
        OutcomeCategory::TimedOut,
        OutcomeCategory::ExecutionError,
    ];

    /// Every non-tolerated outcome is a finding.
    pub fn is_finding(self) -> bool {
        self != OutcomeCategory::Tolerated
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeCategory::Tolerated => "tolerated",
            OutcomeCategory::RejectedGracefully => "rejected_gracefully",
            OutcomeCategory::Crashed => "crashed",
            OutcomeCategory::TimedOut => "timed_out",
            OutcomeCategory::ExecutionError => "execution_error",
        }
    }
}

impl std::fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fingerprint of the document bytes a trial wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

/// A classified trial. Created once by the classifier and never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial: u32,
    pub mutations: Vec<MutationRecord>,
    pub category: OutcomeCategory,
    pub signals: TrialSignals,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentFingerprint>,

    /// Unified diff between the baseline and mutated document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}
