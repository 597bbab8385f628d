//! BDD harness (cucumber-rs).
//!
//! Scenario fixtures live here so step definitions stay short.

use anyhow::Context;
use camino::Utf8Path;
use confmut_types::RunReport;
use fs_err as fs;

/// The service config every scenario starts from.
pub const SERVICE_CONFIG: &str = "timeout: 30\nretries: 3\nmode: strict\n";

/// Boundaries matching [`SERVICE_CONFIG`].
pub const SERVICE_BOUNDARIES: &str = r#"[[boundary]]
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

/// Lay out `svc.yaml` and `confmut.toml` under `root`.
pub fn write_service_fixture(root: &Utf8Path) -> anyhow::Result<()> {
    fs::write(root.join("svc.yaml"), SERVICE_CONFIG)?;
    fs::write(root.join("confmut.toml"), SERVICE_BOUNDARIES)?;
    Ok(())
}

/// Read and decode `report.json` from an output directory.
pub fn read_report(out_dir: &Utf8Path) -> anyhow::Result<RunReport> {
    let path = out_dir.join("report.json");
    let text = fs::read_to_string(&path)?;
    serde_json::from_str(&text).with_context(|| format!("decode {path}"))
}
