//! Table-driven mapping from trial signals to outcome categories.

use confmut_types::{ExecStatus, LintSignal, OutcomeCategory, TrialSignals};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Exit-code conventions used by [`OutcomeClassifier`].
///
/// Explicit sets are consulted in order: rejection, crash, execution
/// error. Codes at or above `signal_exit_threshold` are shell-reported
/// signal deaths and count as crashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierTable {
    pub crash_exit_codes: BTreeSet<i32>,
    pub rejection_exit_codes: BTreeSet<i32>,
    pub execution_error_exit_codes: BTreeSet<i32>,
    pub signal_exit_threshold: i32,
}

impl Default for ClassifierTable {
    fn default() -> Self {
        Self {
            // 101: Rust panic; the rest are 128 + SIGILL/SIGABRT/SIGBUS/SIGFPE/SIGKILL/SIGSEGV.
            crash_exit_codes: [101, 132, 134, 135, 136, 137, 139].into_iter().collect(),
            rejection_exit_codes: BTreeSet::new(),
            execution_error_exit_codes: [126, 127].into_iter().collect(),
            signal_exit_threshold: 128,
        }
    }
}

/// Maps a trial's raw signals to one category.
#[derive(Debug, Clone, Default)]
pub struct OutcomeClassifier {
    table: ClassifierTable,
}

impl OutcomeClassifier {
    pub fn new(table: ClassifierTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ClassifierTable {
        &self.table
    }

    pub fn classify(&self, signals: &TrialSignals) -> OutcomeCategory {
        match &signals.lint {
            LintSignal::Failed { .. } => return OutcomeCategory::Crashed,
            LintSignal::Unavailable { .. } => return OutcomeCategory::ExecutionError,
            LintSignal::Skipped | LintSignal::Passed => {}
        }

        match &signals.exec.status {
            ExecStatus::SpawnFailed { .. } => OutcomeCategory::ExecutionError,
            ExecStatus::TimedOut { .. } => OutcomeCategory::TimedOut,
            ExecStatus::Signaled { .. } => OutcomeCategory::Crashed,
            ExecStatus::Exited { code } => self.classify_exit(*code),
            ExecStatus::NotConfigured | ExecStatus::NotRun => OutcomeCategory::Tolerated,
        }
    }

    fn classify_exit(&self, code: i32) -> OutcomeCategory {
        let table = &self.table;
        if code == 0 {
            OutcomeCategory::Tolerated
        } else if table.rejection_exit_codes.contains(&code) {
            OutcomeCategory::RejectedGracefully
        } else if table.crash_exit_codes.contains(&code) {
            OutcomeCategory::Crashed
        } else if table.execution_error_exit_codes.contains(&code) {
            OutcomeCategory::ExecutionError
        } else if code >= table.signal_exit_threshold {
            OutcomeCategory::Crashed
        } else if code > 0 {
            OutcomeCategory::RejectedGracefully
        } else {
            // Negative codes follow no convention.
            OutcomeCategory::Crashed
        }
    }
}
