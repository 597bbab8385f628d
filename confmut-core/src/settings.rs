//! Clap-free settings for the trial pipeline.

use crate::classify::ClassifierTable;
use crate::error::RunError;
use camino::Utf8PathBuf;
use confmut_codec::Format;
use confmut_types::{BoundarySpec, PathFilter};
use std::time::Duration;

/// How many leaves a trial mutates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Exactly `k` distinct leaves (clamped to the eligible count).
    Count(usize),
    /// Each eligible leaf independently with probability `p`.
    Rate(f64),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Count(1)
    }
}

/// Syntactic check run after each write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LintMode {
    #[default]
    Disabled,
    /// External tool; `{}` is replaced by the written file path.
    Command(String),
    /// Parse the written file back with the codec for its format.
    Builtin,
}

/// Settings for a mutation run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub input: Utf8PathBuf,
    pub output: Option<Utf8PathBuf>,
    pub out_dir: Utf8PathBuf,
    pub work_dir: Utf8PathBuf,

    // Trials
    pub trials: u32,
    pub selection: Selection,
    pub seed: Option<u64>,
    pub once: bool,
    pub keep_going: bool,
    pub jobs: usize,

    // Targets
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub boundaries: BoundarySpec,

    // Command
    pub command: Option<String>,
    pub timeout: Duration,
    pub output_limit: usize,

    // Lint
    pub lint: LintMode,
    pub skip_command_on_lint_failure: bool,

    // Classification
    pub classify: ClassifierTable,

    // Backups
    pub backup: bool,
    pub backup_suffix: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            input: Utf8PathBuf::from("config.yaml"),
            output: None,
            out_dir: Utf8PathBuf::from("artifacts/confmut"),
            work_dir: Utf8PathBuf::from("artifacts/confmut/work"),
            trials: 20,
            selection: Selection::default(),
            seed: None,
            once: false,
            keep_going: true,
            jobs: 1,
            include: Vec::new(),
            exclude: Vec::new(),
            boundaries: BoundarySpec::default(),
            command: None,
            timeout: Duration::from_secs(30),
            output_limit: 4096,
            lint: LintMode::default(),
            skip_command_on_lint_failure: true,
            classify: ClassifierTable::default(),
            backup: true,
            backup_suffix: ".confmut.bak".to_string(),
        }
    }
}

impl RunSettings {
    pub fn validate(&self) -> Result<(), RunError> {
        if self.trials == 0 {
            return Err(RunError::Config("trials must be at least 1".into()));
        }
        if self.jobs == 0 {
            return Err(RunError::Config("jobs must be at least 1".into()));
        }
        if self.jobs > 1 && self.once {
            return Err(RunError::Config(
                "--once mutates the file in place and cannot run with jobs > 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(RunError::Config("timeout must be greater than zero".into()));
        }
        match self.selection {
            Selection::Count(0) => Err(RunError::Config(
                "mutations per trial must be at least 1".into(),
            )),
            Selection::Rate(p) if !(p > 0.0 && p <= 1.0) => Err(RunError::Config(format!(
                "mutation rate must be in (0, 1], got {p}"
            ))),
            _ => Ok(()),
        }
    }

    /// Trials actually planned: `once` always runs a single trial.
    pub fn planned_trials(&self) -> u32 {
        if self.once { 1 } else { self.trials }
    }

    /// Whether trials write over the input file itself.
    pub fn in_place(&self) -> bool {
        self.jobs == 1 && self.output.as_ref().is_none_or(|o| *o == self.input)
    }

    pub fn filter(&self) -> PathFilter {
        PathFilter::new(self.include.clone(), self.exclude.clone())
    }

    pub fn backup_path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}{}", self.input, self.backup_suffix))
    }
}

/// Conventional external linter for a format.
pub fn default_lint_command(format: Format) -> &'static str {
    match format {
        Format::Yaml => "yamllint {}",
        Format::Json => "jsonlint {}",
        Format::Toml => "taplo lint {}",
    }
}
