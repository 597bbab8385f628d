//! Trial planning and the per-trial state machine.
//!
//! A trial moves through
//! `Idle → MutationSelected → DocumentWritten → [Linted] → Executed → Classified → Idle`.
//! Planning (leaf selection and value sampling) is done up front from one
//! seeded generator, so execution order never changes which mutations a
//! seed produces.

use crate::classify::OutcomeClassifier;
use crate::error::TrialError;
use crate::ports::{CommandRunner, Linter, WritePort};
use crate::settings::Selection;
use camino::Utf8Path;
use chrono::Utc;
use confmut_codec::LoadedDocument;
use confmut_doc::ConfigDocument;
use confmut_mutate::{MutationRng, Mutator};
use confmut_types::{
    BoundarySource, DocumentFingerprint, ExecSignal, ExecStatus, LeafPath, LintSignal,
    MutationRecord, OutcomeCategory, PathFilter, Scalar, TrialFailure, TrialOutcome,
    TrialSignals, UnmutatedLeaf,
};
use diffy::PatchFormatter;
use rand::Rng;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPhase {
    Idle,
    MutationSelected,
    DocumentWritten,
    Linted,
    Executed,
    Classified,
}

/// Tracks and logs phase transitions of one trial.
#[derive(Debug)]
struct PhaseLog {
    trial: u32,
    phase: TrialPhase,
}

impl PhaseLog {
    fn new(trial: u32) -> Self {
        Self {
            trial,
            phase: TrialPhase::Idle,
        }
    }

    fn advance(&mut self, next: TrialPhase) {
        debug!(trial = self.trial, from = ?self.phase, to = ?next, "trial phase");
        self.phase = next;
    }
}

/// Leaves a run may mutate, in walk order.
pub fn eligible_leaves(doc: &ConfigDocument, filter: &PathFilter) -> Vec<(LeafPath, Scalar)> {
    doc.leaves()
        .filter(|(path, _)| filter.admits(path))
        .map(|(path, value)| (path, value.clone()))
        .collect()
}

/// Everything decided before a trial touches the filesystem.
#[derive(Debug, Clone)]
pub struct TrialPlan {
    pub trial: u32,
    pub mutations: Vec<MutationRecord>,
    pub unmutated: Vec<UnmutatedLeaf>,
}

impl TrialPlan {
    pub fn edits(&self) -> Vec<(LeafPath, Scalar)> {
        self.mutations
            .iter()
            .map(|m| (m.path.clone(), m.mutated.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Selects leaves and samples replacement values.
#[derive(Debug)]
pub struct TrialPlanner<'a> {
    mutator: &'a Mutator,
    leaves: &'a [(LeafPath, Scalar)],
    selection: Selection,
}

impl<'a> TrialPlanner<'a> {
    pub fn new(mutator: &'a Mutator, leaves: &'a [(LeafPath, Scalar)], selection: Selection) -> Self {
        Self {
            mutator,
            leaves,
            selection,
        }
    }

    /// Indices of the leaves mutated by one trial, ascending.
    fn select(&self, rng: &mut MutationRng) -> Vec<usize> {
        let n = self.leaves.len();
        if n == 0 {
            return Vec::new();
        }
        match self.selection {
            Selection::Count(k) => {
                let mut picked = rand::seq::index::sample(rng, n, k.min(n)).into_vec();
                picked.sort_unstable();
                picked
            }
            Selection::Rate(p) => {
                let picked: Vec<usize> = (0..n).filter(|_| rng.random_bool(p)).collect();
                if picked.is_empty() {
                    vec![rng.random_range(0..n)]
                } else {
                    picked
                }
            }
        }
    }

    pub fn plan(&self, trial: u32, rng: &mut MutationRng) -> TrialPlan {
        let mut plan = TrialPlan {
            trial,
            mutations: Vec::new(),
            unmutated: Vec::new(),
        };
        for index in self.select(rng) {
            let (path, original) = &self.leaves[index];
            match self.mutator.mutate(path, original, rng) {
                Ok(m) => plan.mutations.push(MutationRecord {
                    trial,
                    path: path.clone(),
                    original: original.clone(),
                    tag: original.type_tag(),
                    mutated: m.value,
                    boundary: m.boundary,
                    boundary_source: m.source,
                    strategy: m.strategy.map(|s| s.name().to_string()),
                    at: Utc::now(),
                }),
                Err(e) => {
                    let err = TrialError::from(e);
                    debug!(trial, path = %path, kind = err.kind(), "leaf not mutated: {err}");
                    plan.unmutated.push(UnmutatedLeaf {
                        trial,
                        path: path.clone(),
                        kind: err.kind().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        plan
    }
}

/// Result of executing one planned trial.
#[derive(Debug, Clone)]
pub enum TrialResult {
    Classified(TrialOutcome),
    Failed(TrialFailure),
}

/// Executes planned trials against one loaded document.
pub struct TrialRunner<'a> {
    pub loaded: &'a LoadedDocument,
    /// Rendering of the unmutated document, the left side of finding diffs.
    pub baseline: &'a str,
    pub writer: &'a dyn WritePort,
    pub linter: Option<&'a dyn Linter>,
    pub runner: Option<&'a dyn CommandRunner>,
    pub classifier: &'a OutcomeClassifier,
    pub skip_command_on_lint_failure: bool,
}

impl TrialRunner<'_> {
    /// Run a non-empty plan, writing the mutated document to `target`.
    pub fn run(&self, plan: &TrialPlan, target: &Utf8Path) -> TrialResult {
        let trial = plan.trial;
        let mut phase = PhaseLog::new(trial);
        phase.advance(TrialPhase::MutationSelected);

        let edits = plan.edits();
        let mutated = match self
            .loaded
            .document
            .update_all(edits.iter().map(|(p, v)| (p, v.clone())))
        {
            Ok(doc) => doc,
            Err(e) => return failure(trial, "apply", TrialError::from(e)),
        };
        let text = match self.loaded.render(&mutated, &edits) {
            Ok(text) => text,
            Err(e) => return failure(trial, "serialize", TrialError::Serialization(e)),
        };
        if let Err(e) = self.writer.write_file(target, text.as_bytes()) {
            return failure(trial, "write", TrialError::Write(e));
        }
        let document = DocumentFingerprint {
            path: target.to_string(),
            sha256: confmut_hash::sha256_hex(text.as_bytes()),
            bytes: text.len() as u64,
        };
        phase.advance(TrialPhase::DocumentWritten);

        let lint = match self.linter {
            None => LintSignal::Skipped,
            Some(linter) => {
                let signal = linter.lint(target).unwrap_or_else(|e| {
                    warn!(trial, kind = e.kind(), "{e}");
                    LintSignal::Unavailable {
                        message: e.to_string(),
                    }
                });
                phase.advance(TrialPhase::Linted);
                signal
            }
        };

        let lint_ok = matches!(lint, LintSignal::Skipped | LintSignal::Passed);
        let exec = match self.runner {
            None => ExecSignal::without_output(ExecStatus::NotConfigured),
            Some(_) if !lint_ok && self.skip_command_on_lint_failure => {
                ExecSignal::without_output(ExecStatus::NotRun)
            }
            Some(runner) => runner.run(target).unwrap_or_else(|e| {
                warn!(trial, kind = e.kind(), "{e}");
                ExecSignal::without_output(ExecStatus::SpawnFailed {
                    message: e.to_string(),
                })
            }),
        };
        if let ExecStatus::TimedOut { after_ms } = exec.status {
            let err = TrialError::Timeout { after_ms };
            warn!(trial, kind = err.kind(), "{err}");
        }
        phase.advance(TrialPhase::Executed);

        let signals = TrialSignals { lint, exec };
        let category = self.classifier.classify(&signals);
        phase.advance(TrialPhase::Classified);
        log_outcome(plan, category);

        let patch = category
            .is_finding()
            .then(|| render_patch(target, self.baseline, &text));
        phase.advance(TrialPhase::Idle);

        TrialResult::Classified(TrialOutcome {
            trial,
            mutations: plan.mutations.clone(),
            category,
            signals,
            document: Some(document),
            patch,
        })
    }
}

fn failure(trial: u32, phase: &str, err: TrialError) -> TrialResult {
    warn!(trial, phase, kind = err.kind(), "trial failed: {err}");
    TrialResult::Failed(TrialFailure {
        trial,
        phase: phase.to_string(),
        kind: err.kind().to_string(),
        message: err.to_string(),
    })
}

fn log_outcome(plan: &TrialPlan, category: OutcomeCategory) {
    let paths: Vec<String> = plan.mutations.iter().map(|m| m.path.to_string()).collect();
    let inferred = plan
        .mutations
        .iter()
        .any(|m| m.boundary_source == BoundarySource::Inferred);
    if category.is_finding() {
        warn!(trial = plan.trial, paths = ?paths, %category, inferred, "finding");
    } else {
        info!(trial = plan.trial, paths = ?paths, %category, "tolerated");
    }
}

fn render_patch(path: &Utf8Path, old: &str, new: &str) -> String {
    let path = path.strip_prefix("/").unwrap_or(path);
    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));
    let patch = diffy::create_patch(old, new);
    out.push_str(&PatchFormatter::new().fmt_patch(&patch).to_string());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
