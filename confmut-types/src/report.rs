use crate::boundary::Boundary;
use crate::outcome::{OutcomeCategory, TrialOutcome};
use crate::path::LeafPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final, read-only summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema: String,
    pub run_id: Uuid,
    pub tool: ReportToolInfo,
    pub run: ReportRunInfo,
    pub verdict: ReportVerdict,

    /// Every non-tolerated trial, in trial order.
    #[serde(default)]
    pub findings: Vec<TrialOutcome>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmutated: Vec<UnmutatedLeaf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<TrialFailure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inferred_boundaries: Vec<InferredBoundary>,
}

impl RunReport {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRunInfo {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub seed: u64,
    pub trials_planned: u32,
    pub trials_run: u32,
    pub input: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    pub jobs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVerdict {
    pub status: ReportStatus,
    pub counts: CategoryCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub tolerated: u64,
    pub rejected_gracefully: u64,
    pub crashed: u64,
    pub timed_out: u64,
    pub execution_error: u64,
}

impl CategoryCounts {
    pub fn bump(&mut self, category: OutcomeCategory) {
        *self.slot(category) += 1;
    }

    pub fn get(&self, category: OutcomeCategory) -> u64 {
        match category {
            OutcomeCategory::Tolerated => self.tolerated,
            OutcomeCategory::RejectedGracefully => self.rejected_gracefully,
            OutcomeCategory::Crashed => self.crashed,
            OutcomeCategory::TimedOut => self.timed_out,
            OutcomeCategory::ExecutionError => self.execution_error,
        }
    }

    pub fn total(&self) -> u64 {
        OutcomeCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    fn slot(&mut self, category: OutcomeCategory) -> &mut u64 {
        match category {
            OutcomeCategory::Tolerated => &mut self.tolerated,
            OutcomeCategory::RejectedGracefully => &mut self.rejected_gracefully,
            OutcomeCategory::Crashed => &mut self.crashed,
            OutcomeCategory::TimedOut => &mut self.timed_out,
            OutcomeCategory::ExecutionError => &mut self.execution_error,
        }
    }
}

/// A trial whose selected leaf could not be mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmutatedLeaf {
    pub trial: u32,
    pub path: LeafPath,
    /// Error taxonomy name, e.g. `NoMutationPossibleError`.
    pub kind: String,
    pub reason: String,
}

/// A trial that failed before it could be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub trial: u32,
    pub phase: String,
    pub kind: String,
    pub message: String,
}

/// A boundary the run inferred because none was declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredBoundary {
    pub path: LeafPath,
    pub boundary: Boundary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_bump_and_total() {
        let mut counts = CategoryCounts::default();
        counts.bump(OutcomeCategory::Crashed);
        counts.bump(OutcomeCategory::Crashed);
        counts.bump(OutcomeCategory::Tolerated);
        assert_eq!(counts.get(OutcomeCategory::Crashed), 2);
        assert_eq!(counts.total(), 3);
    }
}
