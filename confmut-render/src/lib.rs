//! Rendering helpers (markdown) for human-readable artifacts.

use confmut_types::{
    ExecStatus, LintSignal, OutcomeCategory, ReportStatus, RunReport, TrialOutcome,
};

pub fn render_report_md(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("# confmut report\n\n");
    out.push_str(&format!("- Verdict: `{}`\n", status_label(report.verdict.status)));
    out.push_str(&format!("- Input: `{}`\n", report.run.input));
    if let Some(command) = &report.run.command {
        out.push_str(&format!("- Command: `{}`\n", command));
    }
    out.push_str(&format!(
        "- Trials: {} run of {} planned (jobs {})\n",
        report.run.trials_run, report.run.trials_planned, report.run.jobs
    ));
    out.push_str(&format!(
        "- Seed: `{}` (rerun with `--seed {}`)\n",
        report.run.seed, report.run.seed
    ));
    out.push_str(&format!("- Duration: {} ms\n\n", report.run.duration_ms));

    out.push_str("## Outcomes\n\n");
    out.push_str("| Category | Trials |\n|---|---|\n");
    for category in OutcomeCategory::ALL {
        out.push_str(&format!(
            "| {} | {} |\n",
            category,
            report.verdict.counts.get(category)
        ));
    }
    out.push('\n');

    out.push_str("## Findings\n\n");
    if report.findings.is_empty() {
        out.push_str("_No findings._\n");
    } else {
        for finding in &report.findings {
            render_finding(&mut out, finding);
        }
    }

    if !report.errors.is_empty() {
        out.push_str("\n## Trial errors\n\n");
        for e in &report.errors {
            out.push_str(&format!(
                "- Trial {} ({}): `{}` {}\n",
                e.trial, e.phase, e.kind, e.message
            ));
        }
    }

    if !report.unmutated.is_empty() {
        out.push_str("\n## Unmutated leaves\n\n");
        for u in &report.unmutated {
            out.push_str(&format!(
                "- Trial {}: `{}` `{}` {}\n",
                u.trial, u.path, u.kind, u.reason
            ));
        }
    }

    if !report.inferred_boundaries.is_empty() {
        out.push_str("\n## Inferred boundaries\n\n");
        for b in &report.inferred_boundaries {
            out.push_str(&format!("- `{}`: {:?}\n", b.path, b.boundary));
        }
    }

    out
}

fn render_finding(out: &mut String, finding: &TrialOutcome) {
    out.push_str(&format!(
        "### Trial {}: {}\n\n",
        finding.trial, finding.category
    ));
    for m in &finding.mutations {
        out.push_str(&format!(
            "- `{}`: `{}` → `{}` ({:?} boundary)\n",
            m.path, m.original, m.mutated, m.boundary_source
        ));
    }
    out.push_str(&format!("- Lint: {}\n", lint_label(&finding.signals.lint)));
    out.push_str(&format!(
        "- Command: {}\n",
        exec_label(&finding.signals.exec.status)
    ));
    let stderr = finding.signals.exec.stderr.trim();
    if !stderr.is_empty() {
        out.push_str(&format!("\n```text\n{}\n```\n", stderr));
    }
    if let Some(patch) = &finding.patch {
        out.push_str(&format!("\n```diff\n{}```\n", patch));
    }
    out.push('\n');
}

fn status_label(s: ReportStatus) -> &'static str {
    match s {
        ReportStatus::Pass => "pass",
        ReportStatus::Fail => "fail",
    }
}

fn lint_label(s: &LintSignal) -> String {
    match s {
        LintSignal::Skipped => "skipped".to_string(),
        LintSignal::Passed => "passed".to_string(),
        LintSignal::Failed { diagnostics } => format!("failed: {}", diagnostics),
        LintSignal::Unavailable { message } => format!("unavailable: {}", message),
    }
}

fn exec_label(s: &ExecStatus) -> String {
    match s {
        ExecStatus::NotConfigured => "not configured".to_string(),
        ExecStatus::NotRun => "not run".to_string(),
        ExecStatus::Exited { code } => format!("exit {}", code),
        ExecStatus::Signaled { signal } => format!("signal {}", signal),
        ExecStatus::TimedOut { after_ms } => format!("timed out after {} ms", after_ms),
        ExecStatus::SpawnFailed { message } => format!("spawn failed: {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use confmut_types::{
        Boundary, BoundarySource, CategoryCounts, ExecSignal, MutationRecord, ReportRunInfo,
        ReportToolInfo, ReportVerdict, Scalar, TrialSignals, TypeTag,
    };

    fn report(findings: Vec<TrialOutcome>) -> RunReport {
        let mut counts = CategoryCounts::default();
        for f in &findings {
            counts.bump(f.category);
        }
        RunReport {
            schema: confmut_types::schema::CONFMUT_REPORT_V1.to_string(),
            run_id: uuid::Uuid::nil(),
            tool: ReportToolInfo {
                name: "confmut".into(),
                version: "0.1.0".into(),
            },
            run: ReportRunInfo {
                started_at: Utc::now(),
                ended_at: Utc::now(),
                duration_ms: 12,
                seed: 99,
                trials_planned: 5,
                trials_run: 5,
                input: "svc.yaml".into(),
                output: None,
                command: Some("./check {}".into()),
                jobs: 1,
            },
            verdict: ReportVerdict {
                status: if findings.is_empty() {
                    ReportStatus::Pass
                } else {
                    ReportStatus::Fail
                },
                counts,
            },
            findings,
            unmutated: Vec::new(),
            errors: Vec::new(),
            inferred_boundaries: Vec::new(),
        }
    }

    #[test]
    fn empty_report_says_no_findings() {
        let md = render_report_md(&report(Vec::new()));
        assert!(md.starts_with("# confmut report\n"));
        assert!(md.contains("- Verdict: `pass`"));
        assert!(md.contains("--seed 99"));
        assert!(md.contains("_No findings._"));
        assert!(md.contains("| crashed | 0 |"));
    }

    #[test]
    fn findings_list_reproduction_details() {
        let finding = TrialOutcome {
            trial: 3,
            mutations: vec![MutationRecord {
                trial: 3,
                path: "timeout".parse().unwrap(),
                original: Scalar::Integer(30),
                mutated: Scalar::Integer(2),
                tag: TypeTag::Integer,
                boundary: Boundary::Integer { min: 1, max: 5 },
                boundary_source: BoundarySource::Declared,
                strategy: None,
                at: Utc::now(),
            }],
            category: OutcomeCategory::Crashed,
            signals: TrialSignals {
                lint: LintSignal::Passed,
                exec: ExecSignal {
                    status: ExecStatus::Signaled { signal: 11 },
                    stdout: String::new(),
                    stderr: "segfault in parse_timeout\n".into(),
                    duration_ms: 4,
                },
            },
            document: None,
            patch: Some("-timeout: 30\n+timeout: 2\n".into()),
        };
        let md = render_report_md(&report(vec![finding]));
        assert!(md.contains("### Trial 3: crashed"));
        assert!(md.contains("- `timeout`: `30` → `2` (Declared boundary)"));
        assert!(md.contains("- Command: signal 11"));
        assert!(md.contains("segfault in parse_timeout"));
        assert!(md.contains("```diff\n-timeout: 30\n+timeout: 2\n```"));
        assert!(md.contains("| crashed | 1 |"));
    }
}
