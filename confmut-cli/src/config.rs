//! Configuration file loading for confmut.
//!
//! Discovers and loads `confmut.toml` next to the input document or in the
//! working directory. Merges config file settings with CLI arguments (CLI
//! takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use confmut_core::{ClassifierTable, Format, LintMode, RunSettings, Selection, default_lint_command};
use confmut_types::{BoundarySpec, FieldBoundary, InferencePolicy};
use fs_err as fs;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "confmut.toml";

/// Top-level configuration from confmut.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfmutConfig {
    pub run: RunConfig,
    pub lint: LintConfig,
    pub targets: TargetsConfig,

    /// Ordered per-field boundaries; the first matching pattern wins.
    pub boundary: Vec<FieldBoundary>,

    pub inference: InferencePolicy,
    pub classify: ClassifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub trials: Option<u32>,
    pub seed: Option<u64>,
    pub mutations_per_trial: Option<usize>,
    pub mutation_rate: Option<f64>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,

    /// Target command template; `{}` is the mutated file path.
    pub command: Option<String>,

    /// Bytes of stdout/stderr kept per trial.
    pub output_limit: Option<usize>,

    pub once: bool,
    pub backup: bool,
    pub keep_going: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: None,
            seed: None,
            mutations_per_trial: None,
            mutation_rate: None,
            timeout_secs: None,
            jobs: None,
            command: None,
            output_limit: None,
            once: false,
            backup: true,
            keep_going: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    pub enabled: bool,
    pub command: Option<String>,
    pub builtin: bool,
    pub skip_command_on_failure: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: None,
            builtin: false,
            skip_command_on_failure: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetsConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Overrides for the exit-code classification table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifyConfig {
    pub crash_exit_codes: Option<BTreeSet<i32>>,
    pub rejection_exit_codes: Option<BTreeSet<i32>>,
    pub execution_error_exit_codes: Option<BTreeSet<i32>>,
}

impl ClassifyConfig {
    fn table(&self) -> ClassifierTable {
        let mut table = ClassifierTable::default();
        if let Some(codes) = &self.crash_exit_codes {
            table.crash_exit_codes = codes.clone();
        }
        if let Some(codes) = &self.rejection_exit_codes {
            table.rejection_exit_codes = codes.clone();
        }
        if let Some(codes) = &self.execution_error_exit_codes {
            table.execution_error_exit_codes = codes.clone();
        }
        table
    }
}

/// Discover `confmut.toml` in the given directories, first match wins.
pub fn discover_config(dirs: &[&Utf8Path]) -> Option<Utf8PathBuf> {
    for dir in dirs {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            debug!("found config file at {}", config_path);
            return Some(config_path);
        }
    }
    debug!("no {} found", CONFIG_FILE_NAME);
    None
}

/// Load and parse a confmut.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ConfmutConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<ConfmutConfig> {
    let config: ConfmutConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the config next to `input` or in the working directory, or the
/// default if neither has one.
pub fn load_or_default(input: &Utf8Path) -> anyhow::Result<ConfmutConfig> {
    let beside = input
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    let mut dirs = vec![beside];
    if beside != Utf8Path::new(".") {
        dirs.push(Utf8Path::new("."));
    }
    match discover_config(&dirs) {
        Some(path) => load_config(&path),
        None => Ok(ConfmutConfig::default()),
    }
}

/// Clap-free view of the command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub input: Utf8PathBuf,
    pub output: Option<Utf8PathBuf>,
    pub test_command: Option<String>,
    pub lint: bool,
    pub lint_command: Option<String>,
    pub lint_builtin: bool,
    pub trials: Option<u32>,
    pub mutations_per_trial: Option<usize>,
    pub mutation_rate: Option<f64>,
    pub seed: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
    pub once: bool,
    pub out_dir: Option<Utf8PathBuf>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub no_backup: bool,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ConfmutConfig,
}

impl ConfigMerger {
    pub fn new(config: ConfmutConfig) -> Self {
        Self { config }
    }

    /// Produce run settings. Scalar CLI flags replace config values, list
    /// flags extend config lists, boolean flags can only switch a feature on
    /// (or, for `--no-backup`, off).
    pub fn merge(self, cli: &CliArgs) -> anyhow::Result<RunSettings> {
        let defaults = RunSettings::default();
        let run = &self.config.run;

        let mut include = self.config.targets.include.clone();
        extend_unique(&mut include, &cli.include);
        let mut exclude = self.config.targets.exclude.clone();
        extend_unique(&mut exclude, &cli.exclude);

        let selection = match (cli.mutation_rate, cli.mutations_per_trial) {
            (Some(p), _) => Selection::Rate(p),
            (None, Some(k)) => Selection::Count(k),
            (None, None) => match (run.mutation_rate, run.mutations_per_trial) {
                (Some(p), _) => Selection::Rate(p),
                (None, Some(k)) => Selection::Count(k),
                (None, None) => defaults.selection,
            },
        };

        let out_dir = cli.out_dir.clone().unwrap_or(defaults.out_dir);
        let work_dir = out_dir.join("work");

        Ok(RunSettings {
            input: cli.input.clone(),
            output: cli.output.clone(),
            work_dir,
            out_dir,
            trials: cli.trials.or(run.trials).unwrap_or(defaults.trials),
            selection,
            seed: cli.seed.or(run.seed),
            once: cli.once || run.once,
            keep_going: run.keep_going,
            jobs: cli.jobs.or(run.jobs).unwrap_or(defaults.jobs),
            include,
            exclude,
            boundaries: BoundarySpec::new(self.config.boundary.clone())
                .with_inference(self.config.inference.clone()),
            command: cli.test_command.clone().or_else(|| run.command.clone()),
            timeout: cli
                .timeout_secs
                .or(run.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            output_limit: run.output_limit.unwrap_or(defaults.output_limit),
            lint: self.lint_mode(cli)?,
            skip_command_on_lint_failure: self.config.lint.skip_command_on_failure,
            classify: self.config.classify.table(),
            backup: run.backup && !cli.no_backup,
            backup_suffix: defaults.backup_suffix,
        })
    }

    fn lint_mode(&self, cli: &CliArgs) -> anyhow::Result<LintMode> {
        let lint = &self.config.lint;
        if cli.lint_builtin {
            return Ok(LintMode::Builtin);
        }
        if let Some(command) = &cli.lint_command {
            return Ok(LintMode::Command(command.clone()));
        }
        if !(cli.lint || lint.enabled || lint.builtin) {
            return Ok(LintMode::Disabled);
        }
        if lint.builtin {
            return Ok(LintMode::Builtin);
        }
        match &lint.command {
            Some(command) => Ok(LintMode::Command(command.clone())),
            None => {
                let format = Format::from_path(&cli.input)
                    .with_context(|| format!("pick a default linter for {}", cli.input))?;
                Ok(LintMode::Command(default_lint_command(format).to_string()))
            }
        }
    }
}

fn extend_unique(into: &mut Vec<String>, extra: &[String]) {
    for pattern in extra {
        if !into.contains(pattern) {
            into.push(pattern.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confmut_types::{Boundary, Scalar};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn args(input: &str) -> CliArgs {
        CliArgs {
            input: input.into(),
            ..CliArgs::default()
        }
    }

    #[test]
    fn test_parse_full_config() {
        let contents = r#"
[run]
trials = 50
seed = 7
mutations_per_trial = 2
timeout_secs = 5
jobs = 2
command = "./svc --check {}"
keep_going = false

[lint]
enabled = true
command = "yamllint -d relaxed {}"

[targets]
include = ["server.*"]
exclude = ["server.name"]

[[boundary]]
path = "server.timeout"
kind = "integer"
min = 1
max = 5

[[boundary]]
path = "server.mode"
kind = "enum"
values = ["strict", "lenient"]

[[boundary]]
path = "ratio"
kind = "float"
min = 0
max = 1.5

[inference]
factor = 4.0

[classify]
rejection_exit_codes = [2, 64]
"#;
        let config = parse_config(contents).unwrap();
        assert_eq!(config.run.trials, Some(50));
        assert!(!config.run.keep_going);
        assert!(config.run.backup);
        assert_eq!(config.boundary.len(), 3);
        assert_eq!(
            config.boundary[0].boundary,
            Boundary::Integer { min: 1, max: 5 }
        );
        assert_eq!(
            config.boundary[1].boundary,
            Boundary::Enum {
                values: vec![Scalar::from("strict"), Scalar::from("lenient")]
            }
        );
        assert_eq!(
            config.boundary[2].boundary,
            Boundary::Float { min: 0.0, max: 1.5 }
        );
        assert_eq!(config.inference.factor, 4.0);

        let settings = ConfigMerger::new(config).merge(&args("svc.yaml")).unwrap();
        assert_eq!(settings.trials, 50);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.selection, Selection::Count(2));
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.jobs, 2);
        assert_eq!(settings.command.as_deref(), Some("./svc --check {}"));
        assert_eq!(
            settings.lint,
            LintMode::Command("yamllint -d relaxed {}".into())
        );
        assert!(settings.classify.rejection_exit_codes.contains(&64));
        assert!(settings.classify.crash_exit_codes.contains(&139));
        assert_eq!(settings.boundaries.inference.factor, 4.0);
        assert!(!settings.keep_going);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.boundary.is_empty());
        assert!(config.run.backup);
        assert!(config.lint.skip_command_on_failure);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = parse_config("[run]\ntrails = 3\n").unwrap_err();
        assert!(format!("{err:#}").contains("trails"), "{err:#}");
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = parse_config(
            r#"
[run]
trials = 50
mutation_rate = 0.2
command = "from-config {}"

[targets]
include = ["a.*"]
"#,
        )
        .unwrap();
        let cli = CliArgs {
            trials: Some(3),
            mutations_per_trial: Some(2),
            test_command: Some("from-cli {}".into()),
            include: vec!["b.*".into(), "a.*".into()],
            no_backup: true,
            out_dir: Some("out".into()),
            ..args("svc.json")
        };
        let settings = ConfigMerger::new(config).merge(&cli).unwrap();
        assert_eq!(settings.trials, 3);
        assert_eq!(settings.selection, Selection::Count(2));
        assert_eq!(settings.command.as_deref(), Some("from-cli {}"));
        assert_eq!(settings.include, vec!["a.*".to_string(), "b.*".to_string()]);
        assert!(!settings.backup);
        assert_eq!(settings.work_dir, Utf8PathBuf::from("out/work"));
    }

    #[test]
    fn test_lint_modes() {
        let merge = |config: &str, cli: CliArgs| {
            ConfigMerger::new(parse_config(config).unwrap())
                .merge(&cli)
                .unwrap()
                .lint
        };
        assert_eq!(merge("", args("a.yaml")), LintMode::Disabled);
        assert_eq!(
            merge("", CliArgs { lint: true, ..args("a.yaml") }),
            LintMode::Command("yamllint {}".into())
        );
        assert_eq!(
            merge("", CliArgs { lint: true, ..args("a.toml") }),
            LintMode::Command("taplo lint {}".into())
        );
        assert_eq!(
            merge("[lint]\nbuiltin = true\n", args("a.json")),
            LintMode::Builtin
        );
        assert_eq!(
            merge(
                "[lint]\nbuiltin = true\n",
                CliArgs {
                    lint_command: Some("check {}".into()),
                    ..args("a.json")
                }
            ),
            LintMode::Command("check {}".into())
        );
        assert_eq!(
            merge("", CliArgs { lint_builtin: true, ..args("a.json") }),
            LintMode::Builtin
        );
    }

    #[test]
    fn test_discover_prefers_input_directory() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let nested = root.join("conf");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(discover_config(&[&nested, &root]).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            discover_config(&[&nested, &root]),
            Some(root.join(CONFIG_FILE_NAME))
        );

        std::fs::write(nested.join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            discover_config(&[&nested, &root]),
            Some(nested.join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn test_load_or_default_reads_config_beside_input() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        std::fs::write(root.join(CONFIG_FILE_NAME), "[run]\ntrials = 4\n").unwrap();
        let cfg = load_or_default(&root.join("svc.yaml")).expect("load");
        assert_eq!(cfg.run.trials, Some(4));
    }
}
