use assert_cmd::Command;
use camino::Utf8PathBuf;
use confmut_bdd::{read_report, write_service_fixture};
use confmut_types::{OutcomeCategory, ReportStatus, RunReport};
use cucumber::{World, given, then, when};
use fs_err as fs;
use tempfile::TempDir;

#[derive(Debug, Default, World)]
pub struct ConfmutWorld {
    temp: Option<TempDir>,
    root: Option<Utf8PathBuf>,
    exit_code: Option<i32>,
}

fn root(world: &ConfmutWorld) -> &Utf8PathBuf {
    world.root.as_ref().expect("root set")
}

fn report(world: &ConfmutWorld) -> RunReport {
    read_report(&root(world).join("out")).expect("report.json")
}

fn category(name: &str) -> OutcomeCategory {
    OutcomeCategory::ALL
        .into_iter()
        .find(|c| c.as_str() == name)
        .unwrap_or_else(|| panic!("unknown category {name}"))
}

fn run_confmut(world: &mut ConfmutWorld, args: &[&str]) {
    let root = root(world).clone();
    let output = Command::cargo_bin("confmut")
        .expect("confmut binary")
        .current_dir(root.as_str())
        .arg("svc.yaml")
        .args(["--out-dir", "out", "--seed", "42"])
        .args(args)
        .timeout(std::time::Duration::from_secs(60))
        .output()
        .expect("run confmut");
    world.exit_code = output.status.code();
}

#[given("a service config with declared boundaries")]
async fn service_config(world: &mut ConfmutWorld) {
    let td = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
    write_service_fixture(&root).expect("fixture");
    world.temp = Some(td);
    world.root = Some(root);
}

#[when(expr = "I run confmut with command {string} for {int} trials")]
async fn run_with_command(world: &mut ConfmutWorld, command: String, trials: u32) {
    let trials = trials.to_string();
    run_confmut(world, &["-t", &command, "-n", &trials]);
}

#[when(expr = "I run confmut with command {string} for {int} trials and a {int} second timeout")]
async fn run_with_timeout(world: &mut ConfmutWorld, command: String, trials: u32, secs: u32) {
    let (trials, secs) = (trials.to_string(), secs.to_string());
    run_confmut(
        world,
        &["-t", &command, "-n", &trials, "--timeout-secs", &secs],
    );
}

#[when(expr = "I run confmut on {string} only with command {string} for {int} trials")]
async fn run_on_leaf(world: &mut ConfmutWorld, leaf: String, command: String, trials: u32) {
    let trials = trials.to_string();
    run_confmut(
        world,
        &["--include", &leaf, "-t", &command, "-n", &trials],
    );
}

#[when(expr = "I run confmut once on {string} only")]
async fn run_once(world: &mut ConfmutWorld, leaf: String) {
    run_confmut(world, &["--include", &leaf, "--once"]);
}

#[then(expr = "the run exits with code {int}")]
async fn assert_exit_code(world: &mut ConfmutWorld, code: i32) {
    assert_eq!(world.exit_code, Some(code));
}

#[then(expr = "the report verdict is {string}")]
async fn assert_verdict(world: &mut ConfmutWorld, status: String) {
    let expected = match status.as_str() {
        "pass" => ReportStatus::Pass,
        "fail" => ReportStatus::Fail,
        other => panic!("unknown verdict {other}"),
    };
    assert_eq!(report(world).verdict.status, expected);
}

#[then(expr = "{int} trials are classified as {string}")]
async fn assert_category_count(world: &mut ConfmutWorld, count: u64, name: String) {
    let report = report(world);
    assert_eq!(
        report.verdict.counts.get(category(&name)),
        count,
        "counts: {:?}",
        report.verdict.counts
    );
}

#[then(expr = "the report has {int} findings")]
async fn assert_finding_count(world: &mut ConfmutWorld, count: usize) {
    assert_eq!(report(world).findings.len(), count);
}

#[then("every finding names the mutated leaf and both values")]
async fn assert_findings_reproducible(world: &mut ConfmutWorld) {
    let report = report(world);
    assert!(!report.findings.is_empty());
    for finding in &report.findings {
        assert!(!finding.mutations.is_empty(), "trial {}", finding.trial);
        for m in &finding.mutations {
            assert_ne!(m.original, m.mutated, "{}", m.path);
        }
        assert!(finding.patch.is_some(), "trial {}", finding.trial);
    }
}

#[then("the service config is unchanged")]
async fn assert_config_unchanged(world: &mut ConfmutWorld) {
    let contents = fs::read_to_string(root(world).join("svc.yaml")).unwrap();
    assert_eq!(contents, confmut_bdd::SERVICE_CONFIG);
}

#[then(expr = "the service config timeout lies between {int} and {int}")]
async fn assert_timeout_in_range(world: &mut ConfmutWorld, min: i64, max: i64) {
    let contents = fs::read_to_string(root(world).join("svc.yaml")).unwrap();
    let line = contents
        .lines()
        .find(|l| l.starts_with("timeout:"))
        .expect("timeout line");
    let value: i64 = line["timeout:".len()..].trim().parse().expect("integer");
    assert!((min..=max).contains(&value), "timeout = {value}");
    assert!(contents.contains("mode: strict"));
}

#[tokio::main]
async fn main() {
    let features_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("features");
    ConfmutWorld::cucumber().run(features_path).await;
}
