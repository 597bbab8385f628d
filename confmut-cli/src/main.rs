use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use confmut_cli::config::{self, CliArgs, ConfigMerger};
use confmut_core::adapters::{
    CommandLinter, FsDocumentSource, FsWritePort, ParseBackLinter, ShellCommandRunner,
};
use confmut_core::ports::{CommandRunner, Linter};
use confmut_core::{Format, LintMode, RunSettings, run_trials, write_report_artifacts};
use confmut_types::{OutcomeCategory, ReportToolInfo};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "confmut",
    version,
    about = "Boundary-constrained mutation testing for configuration files."
)]
struct Cli {
    /// Configuration document to mutate (.json, .yaml, .yml, .toml).
    config_file: Utf8PathBuf,

    /// Write mutated documents here instead of over the input.
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Command run after each mutation; `{}` is replaced by the mutated file path.
    #[arg(short = 't', long)]
    test_command: Option<String>,

    /// Lint each mutated document with the conventional tool for its format.
    #[arg(long, default_value_t = false)]
    lint: bool,

    /// Lint with this command instead; `{}` is the mutated file path.
    #[arg(long)]
    lint_command: Option<String>,

    /// Lint by parsing the mutated document back.
    #[arg(long, default_value_t = false)]
    lint_builtin: bool,

    /// Number of trials.
    #[arg(short = 'n', long)]
    trials: Option<u32>,

    /// Leaves mutated per trial.
    #[arg(short = 'k', long, conflicts_with = "mutation_rate")]
    mutations_per_trial: Option<usize>,

    /// Probability that each leaf is mutated in a trial.
    #[arg(short = 'm', long)]
    mutation_rate: Option<f64>,

    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Kill the test command after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Run trials on this many workers, each on its own copy of the document.
    #[arg(long)]
    jobs: Option<usize>,

    /// Mutate once, run the command, and leave the mutated file in place.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Output directory for report artifacts (default: artifacts/confmut).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Config file (default: confmut.toml beside the input or in the working directory).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Only mutate leaves matching these path patterns.
    #[arg(long)]
    include: Vec<String>,

    /// Never mutate leaves matching these path patterns.
    #[arg(long)]
    exclude: Vec<String>,

    /// Do not back up the input before an in-place run.
    #[arg(long, default_value_t = false)]
    no_backup: bool,

    /// Print the report JSON to stdout.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Debug logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn args(&self) -> CliArgs {
        CliArgs {
            input: self.config_file.clone(),
            output: self.output.clone(),
            test_command: self.test_command.clone(),
            lint: self.lint,
            lint_command: self.lint_command.clone(),
            lint_builtin: self.lint_builtin,
            trials: self.trials,
            mutations_per_trial: self.mutations_per_trial,
            mutation_rate: self.mutation_rate,
            seed: self.seed,
            timeout_secs: self.timeout_secs,
            jobs: self.jobs,
            once: self.once,
            out_dir: self.out_dir.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            no_backup: self.no_backup,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match real_main(&cli) {
        Ok(true) => ExitCode::from(2),
        Ok(false) => ExitCode::from(0),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether the run produced findings.
fn real_main(cli: &Cli) -> anyhow::Result<bool> {
    let file_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(&cli.config_file).context("load confmut.toml config")?,
    };
    let settings = ConfigMerger::new(file_config).merge(&cli.args())?;
    debug!(?settings, "merged settings");

    let linter = build_linter(&settings)?;
    let runner = settings
        .command
        .as_ref()
        .map(|t| ShellCommandRunner::new(t.clone(), settings.timeout, settings.output_limit));

    let source = FsDocumentSource::new(settings.input.clone());
    let outcome = run_trials(
        &settings,
        &source,
        &FsWritePort,
        linter.as_deref(),
        runner.as_ref().map(|r| r as &dyn CommandRunner),
        tool_info(),
    )?;

    write_report_artifacts(&outcome.report, &settings.out_dir, &FsWritePort)
        .context("write report artifacts")?;

    let counts = &outcome.report.verdict.counts;
    info!(
        tolerated = counts.get(OutcomeCategory::Tolerated),
        rejected_gracefully = counts.get(OutcomeCategory::RejectedGracefully),
        crashed = counts.get(OutcomeCategory::Crashed),
        timed_out = counts.get(OutcomeCategory::TimedOut),
        execution_error = counts.get(OutcomeCategory::ExecutionError),
        seed = outcome.report.run.seed,
        "wrote report to {}",
        settings.out_dir
    );

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome.report).context("serialize report")?;
        println!("{json}");
    }
    Ok(outcome.findings)
}

fn build_linter(settings: &RunSettings) -> anyhow::Result<Option<Box<dyn Linter>>> {
    Ok(match &settings.lint {
        LintMode::Disabled => None,
        LintMode::Builtin => Some(Box::new(ParseBackLinter {
            format: Format::from_path(&settings.input)?,
        })),
        LintMode::Command(template) => Some(Box::new(CommandLinter {
            template: template.clone(),
            timeout: settings.timeout,
            output_limit: settings.output_limit,
        })),
    })
}

fn tool_info() -> ReportToolInfo {
    ReportToolInfo {
        name: "confmut".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
