//! Accumulates trial outcomes into the final run report.

use chrono::{DateTime, Utc};
use confmut_types::{
    Boundary, CategoryCounts, InferredBoundary, LeafPath, ReportRunInfo, ReportStatus,
    ReportToolInfo, ReportVerdict, RunReport, TrialFailure, TrialOutcome, UnmutatedLeaf,
};
use std::collections::BTreeSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Fields of the run section known before any trial executes.
#[derive(Debug, Clone)]
pub struct RunHeader {
    pub started_at: DateTime<Utc>,
    pub seed: u64,
    pub trials_planned: u32,
    pub input: String,
    pub output: Option<String>,
    pub command: Option<String>,
    pub jobs: usize,
}

#[derive(Debug)]
pub struct ReportAggregator {
    header: RunHeader,
    counts: CategoryCounts,
    trials_run: u32,
    findings: Vec<TrialOutcome>,
    unmutated: Vec<UnmutatedLeaf>,
    errors: Vec<TrialFailure>,
    inferred: Vec<InferredBoundary>,
    inferred_seen: BTreeSet<LeafPath>,
}

impl ReportAggregator {
    pub fn new(header: RunHeader) -> Self {
        Self {
            header,
            counts: CategoryCounts::default(),
            trials_run: 0,
            findings: Vec::new(),
            unmutated: Vec::new(),
            errors: Vec::new(),
            inferred: Vec::new(),
            inferred_seen: BTreeSet::new(),
        }
    }

    /// Count a classified trial; non-tolerated outcomes are kept as findings.
    pub fn record_outcome(&mut self, outcome: TrialOutcome) {
        self.trials_run += 1;
        self.counts.bump(outcome.category);
        if outcome.category.is_finding() {
            self.findings.push(outcome);
        }
    }

    pub fn record_unmutated(&mut self, leaf: UnmutatedLeaf) {
        self.unmutated.push(leaf);
    }

    /// A trial that stopped before classification.
    pub fn record_failure(&mut self, failure: TrialFailure) {
        self.trials_run += 1;
        self.errors.push(failure);
    }

    /// Log an inferred boundary, once per leaf per run.
    pub fn note_inferred(&mut self, path: &LeafPath, boundary: &Boundary) {
        if self.inferred_seen.insert(path.clone()) {
            warn!(path = %path, ?boundary, "no declared boundary; using inferred range");
            self.inferred.push(InferredBoundary {
                path: path.clone(),
                boundary: boundary.clone(),
            });
        }
    }

    pub fn counts(&self) -> &CategoryCounts {
        &self.counts
    }

    pub fn finding_count(&self) -> usize {
        self.findings.len()
    }

    pub fn finalize(self, tool: ReportToolInfo, ended_at: DateTime<Utc>) -> RunReport {
        let status = if self.findings.is_empty() {
            ReportStatus::Pass
        } else {
            ReportStatus::Fail
        };
        let duration_ms = (ended_at - self.header.started_at)
            .num_milliseconds()
            .max(0) as u64;
        info!(
            trials = self.trials_run,
            findings = self.findings.len(),
            errors = self.errors.len(),
            ?status,
            "run finished"
        );

        RunReport {
            schema: confmut_types::schema::CONFMUT_REPORT_V1.to_string(),
            run_id: Uuid::new_v4(),
            tool,
            run: ReportRunInfo {
                started_at: self.header.started_at,
                ended_at,
                duration_ms,
                seed: self.header.seed,
                trials_planned: self.header.trials_planned,
                trials_run: self.trials_run,
                input: self.header.input,
                output: self.header.output,
                command: self.header.command,
                jobs: self.header.jobs,
            },
            verdict: ReportVerdict {
                status,
                counts: self.counts,
            },
            findings: self.findings,
            unmutated: self.unmutated,
            errors: self.errors,
            inferred_boundaries: self.inferred,
        }
    }
}
