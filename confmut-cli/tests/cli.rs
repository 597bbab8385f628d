//! End-to-end tests driving the `confmut` binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG: &str = "timeout: 30\nretries: 3\nmode: strict\n";

const BOUNDARIES: &str = r#"
[[boundary]]
path = "timeout"
kind = "integer"
min = 1
max = 5

[[boundary]]
path = "retries"
kind = "integer"
min = 0
max = 10

[[boundary]]
path = "mode"
kind = "enum"
values = ["strict", "lenient"]
"#;

fn confmut() -> Command {
    Command::cargo_bin("confmut").expect("confmut binary")
}

fn workspace() -> (TempDir, PathBuf) {
    let td = tempfile::tempdir().expect("tempdir");
    let input = td.path().join("svc.yaml");
    fs::write(&input, CONFIG).unwrap();
    fs::write(td.path().join("confmut.toml"), BOUNDARIES).unwrap();
    (td, input)
}

fn report(dir: &Path) -> Value {
    let text = fs::read_to_string(dir.join("out/report.json")).expect("report.json");
    serde_json::from_str(&text).expect("valid report json")
}

#[test]
fn tolerant_command_passes_and_restores_input() {
    let (td, input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "-t", "true", "-n", "10", "--seed", "1", "--out-dir", "out"])
        .assert()
        .code(0);

    let report = report(td.path());
    assert_eq!(report["verdict"]["status"], "pass");
    assert_eq!(report["verdict"]["counts"]["tolerated"], 10);
    assert_eq!(fs::read_to_string(&input).unwrap(), CONFIG);
    assert_eq!(
        fs::read_to_string(td.path().join("svc.yaml.confmut.bak")).unwrap(),
        CONFIG
    );
    assert!(td.path().join("out/report.md").exists());
}

#[test]
fn crashing_command_is_a_finding() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "-t", "kill -SEGV $$", "-n", "3", "--out-dir", "out"])
        .assert()
        .code(2);

    let report = report(td.path());
    assert_eq!(report["verdict"]["status"], "fail");
    assert_eq!(report["verdict"]["counts"]["crashed"], 3);
    let finding = &report["findings"][0];
    assert_eq!(finding["category"], "crashed");
    assert!(finding["mutations"][0]["path"].is_string());
}

#[test]
fn missing_binary_is_an_execution_error_and_the_run_continues() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args([
            "svc.yaml",
            "-t",
            "confmut-no-such-binary {}",
            "-n",
            "4",
            "--out-dir",
            "out",
        ])
        .assert()
        .code(2);

    let report = report(td.path());
    assert_eq!(report["run"]["trials_run"], 4);
    assert_eq!(report["verdict"]["counts"]["execution_error"], 4);
}

#[test]
fn nonzero_exit_is_rejected_gracefully() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args([
            "svc.yaml",
            "-t",
            "grep -q 'timeout: 30' {}",
            "--include",
            "timeout",
            "-n",
            "5",
            "--out-dir",
            "out",
        ])
        .assert()
        .code(2);

    let report = report(td.path());
    assert_eq!(report["verdict"]["counts"]["rejected_gracefully"], 5);
    assert_eq!(report["verdict"]["counts"]["crashed"], 0);
}

#[test]
fn slow_command_times_out() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args([
            "svc.yaml",
            "-t",
            "sleep 30",
            "-n",
            "1",
            "--timeout-secs",
            "1",
            "--out-dir",
            "out",
        ])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .code(2);

    assert_eq!(report(td.path())["verdict"]["counts"]["timed_out"], 1);
}

#[test]
fn same_seed_same_report_mutations() {
    let (td, _input) = workspace();
    let run = |out: &str| {
        confmut()
            .current_dir(td.path())
            .args(["svc.yaml", "-t", "false", "-n", "6", "--seed", "77", "--out-dir", out])
            .assert()
            .code(2);
        let text = fs::read_to_string(td.path().join(out).join("report.json")).unwrap();
        let report: Value = serde_json::from_str(&text).unwrap();
        report["findings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| (f["mutations"][0]["path"].clone(), f["mutations"][0]["mutated"].clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(run("a"), run("b"));
}

#[test]
fn once_leaves_the_mutated_file() {
    let (td, input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "--once", "--include", "timeout", "--out-dir", "out"])
        .assert()
        .code(0);

    let text = fs::read_to_string(&input).unwrap();
    assert_ne!(text, CONFIG);
    assert!(text.contains("retries: 3"));
    assert!(text.contains("mode: strict"));
}

#[test]
fn output_flag_keeps_input_untouched() {
    let (td, input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "-o", "mutated.yaml", "-n", "3", "--out-dir", "out"])
        .assert()
        .code(0);

    assert_eq!(fs::read_to_string(&input).unwrap(), CONFIG);
    assert!(td.path().join("mutated.yaml").exists());
    assert!(!td.path().join("svc.yaml.confmut.bak").exists());
}

#[test]
fn json_flag_prints_report() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "-n", "2", "--seed", "5", "--json", "--out-dir", "out"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"schema\": \"confmut.report.v1\""))
        .stdout(predicate::str::contains("\"seed\": 5"));
}

#[test]
fn builtin_lint_passes_valid_mutations() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "--lint-builtin", "-t", "true", "-n", "5", "--out-dir", "out"])
        .assert()
        .code(0);
}

#[test]
fn lint_failure_is_a_crash() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args([
            "svc.yaml",
            "--lint-command",
            "echo 'syntax error' >&2; exit 1",
            "-t",
            "true",
            "-n",
            "2",
            "--out-dir",
            "out",
        ])
        .assert()
        .code(2);

    let report = report(td.path());
    assert_eq!(report["verdict"]["counts"]["crashed"], 2);
    assert_eq!(report["findings"][0]["signals"]["exec"]["status"]["status"], "not_run");
}

#[test]
fn unsupported_format_is_fatal() {
    let td = tempfile::tempdir().unwrap();
    fs::write(td.path().join("svc.ini"), "a=1\n").unwrap();
    confmut()
        .current_dir(td.path())
        .args(["svc.ini", "--out-dir", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("svc.ini"));
}

#[test]
fn parallel_once_is_rejected() {
    let (td, _input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "--jobs", "2", "--once", "--out-dir", "out"])
        .assert()
        .code(1);
}

#[test]
fn parallel_jobs_write_per_trial_files() {
    let (td, input) = workspace();
    confmut()
        .current_dir(td.path())
        .args(["svc.yaml", "--jobs", "3", "-t", "cat {}", "-n", "6", "--out-dir", "out"])
        .assert()
        .code(0);

    assert_eq!(fs::read_to_string(&input).unwrap(), CONFIG);
    for n in 0..6 {
        assert!(td.path().join(format!("out/work/trial-{n}.yaml")).exists());
    }
    assert_eq!(report(td.path())["run"]["jobs"], 3);
}

#[test]
fn conflicting_selection_flags_are_a_usage_error() {
    confmut()
        .args(["svc.yaml", "-k", "2", "-m", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
