use crate::aggregate::{ReportAggregator, RunHeader};
use crate::classify::OutcomeClassifier;
use crate::error::RunError;
use crate::ports::{CommandRunner, DocumentSource, Linter, WritePort};
use crate::settings::RunSettings;
use crate::trial::{TrialPlan, TrialPlanner, TrialResult, TrialRunner, eligible_leaves};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use confmut_mutate::{MutationRng, Mutator};
use confmut_render::render_report_md;
use confmut_types::{BoundarySource, ReportToolInfo, RunReport};
use rayon::prelude::*;
use tracing::{debug, info};

/// Outcome of `run_trials`.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    /// At least one non-tolerated trial (exit code 2).
    pub findings: bool,
}

/// Run every planned trial and build the report.
///
/// Per-trial failures end up in the report; only loading the document,
/// invalid settings, and unwritable output abort the run.
pub fn run_trials(
    settings: &RunSettings,
    source: &dyn DocumentSource,
    writer: &dyn WritePort,
    linter: Option<&dyn Linter>,
    runner: Option<&dyn CommandRunner>,
    tool: ReportToolInfo,
) -> Result<RunOutcome, RunError> {
    settings.validate()?;
    let mutator = Mutator::new(settings.boundaries.clone())?;
    let started_at = Utc::now();

    let loaded = source.load().map_err(RunError::Load)?;
    let leaves = eligible_leaves(&loaded.document, &settings.filter());
    if leaves.is_empty() {
        return Err(RunError::NoTargets {
            input: loaded.path.to_string(),
        });
    }

    let mut rng = MutationRng::new(settings.seed);
    let seed = rng.seed();
    let trials = settings.planned_trials();
    info!(
        input = %loaded.path,
        format = %loaded.format,
        leaves = leaves.len(),
        trials,
        seed,
        jobs = settings.jobs,
        "starting run"
    );

    let planner = TrialPlanner::new(&mutator, &leaves, settings.selection);
    let plans: Vec<TrialPlan> = (0..trials).map(|t| planner.plan(t, &mut rng)).collect();

    let baseline = loaded
        .render(&loaded.document, &[])
        .unwrap_or_else(|_| loaded.source.clone());
    let classifier = OutcomeClassifier::new(settings.classify.clone());
    let trial_runner = TrialRunner {
        loaded: &loaded,
        baseline: &baseline,
        writer,
        linter,
        runner,
        classifier: &classifier,
        skip_command_on_lint_failure: settings.skip_command_on_lint_failure,
    };

    let sequential_target = settings.output.clone().unwrap_or_else(|| settings.input.clone());
    let mut agg = ReportAggregator::new(RunHeader {
        started_at,
        seed,
        trials_planned: trials,
        input: loaded.path.to_string(),
        output: (settings.jobs == 1).then(|| sequential_target.to_string()),
        command: settings.command.clone(),
        jobs: settings.jobs,
    });

    if settings.jobs == 1 {
        run_sequential(settings, &trial_runner, &plans, &sequential_target, &mut agg)?;
    } else {
        run_parallel(settings, &trial_runner, &plans, &mut agg)?;
    }

    let report = agg.finalize(tool, Utc::now());
    let findings = report.has_findings();
    Ok(RunOutcome { report, findings })
}

fn record(agg: &mut ReportAggregator, plan: &TrialPlan, result: Option<TrialResult>) {
    for leaf in &plan.unmutated {
        agg.record_unmutated(leaf.clone());
    }
    for m in &plan.mutations {
        if m.boundary_source == BoundarySource::Inferred {
            agg.note_inferred(&m.path, &m.boundary);
        }
    }
    match result {
        Some(TrialResult::Classified(outcome)) => agg.record_outcome(outcome),
        Some(TrialResult::Failed(failure)) => agg.record_failure(failure),
        None => debug!(trial = plan.trial, "nothing mutated; trial not executed"),
    }
}

fn run_sequential(
    settings: &RunSettings,
    runner: &TrialRunner<'_>,
    plans: &[TrialPlan],
    target: &Utf8Path,
    agg: &mut ReportAggregator,
) -> Result<(), RunError> {
    let original = runner.loaded.source.as_bytes();
    if settings.in_place() && settings.backup {
        let backup = settings.backup_path();
        runner
            .writer
            .write_file(&backup, original)
            .map_err(RunError::Output)?;
        debug!(backup = %backup, "backed up input");
    }
    // Fails fast when the target is not writable at all.
    runner
        .writer
        .write_file(target, original)
        .map_err(RunError::Output)?;

    for plan in plans {
        if plan.is_empty() {
            record(agg, plan, None);
            continue;
        }
        let result = runner.run(plan, target);
        record(agg, plan, Some(result));

        if !settings.once {
            runner
                .writer
                .write_file(target, original)
                .with_context(|| format!("restore {target} after trial {}", plan.trial))
                .map_err(RunError::Output)?;
        }
        if !settings.keep_going && agg.finding_count() > 0 {
            info!(trial = plan.trial, "stopping at first finding");
            break;
        }
    }
    Ok(())
}

fn trial_file(work_dir: &Utf8Path, trial: u32, ext: &str) -> Utf8PathBuf {
    work_dir.join(format!("trial-{trial}.{ext}"))
}

fn run_parallel(
    settings: &RunSettings,
    runner: &TrialRunner<'_>,
    plans: &[TrialPlan],
    agg: &mut ReportAggregator,
) -> Result<(), RunError> {
    runner
        .writer
        .create_dir_all(&settings.work_dir)
        .map_err(RunError::Output)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.jobs)
        .build()
        .context("build worker pool")?;
    let ext = runner.loaded.format.extension();

    let results: Vec<Option<TrialResult>> = pool.install(|| {
        plans
            .par_iter()
            .map(|plan| {
                (!plan.is_empty())
                    .then(|| runner.run(plan, &trial_file(&settings.work_dir, plan.trial, ext)))
            })
            .collect()
    });

    for (plan, result) in plans.iter().zip(results) {
        record(agg, plan, result);
    }
    Ok(())
}

/// Write `report.json` and `report.md` to the output directory.
pub fn write_report_artifacts(
    report: &RunReport,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    writer.write_file(&out_dir.join("report.json"), json.as_bytes())?;

    let md = render_report_md(report);
    writer.write_file(&out_dir.join("report.md"), md.as_bytes())?;
    Ok(())
}
