//! Embeddable core library for confmut.
//!
//! Provides a clap-free, I/O-abstracted entry point for running mutation
//! trials against a configuration document.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`DocumentSource`](ports::DocumentSource): load the original document
//! - [`WritePort`](ports::WritePort): write files and create directories
//! - [`Linter`](ports::Linter): syntactic check of a written document
//! - [`CommandRunner`](ports::CommandRunner): run the target command
//!
//! The [`adapters`] module provides default filesystem and process-backed
//! implementations.
//!
//! # Entry points
//!
//! - [`run_trials`](pipeline::run_trials): plan, execute and classify trials
//! - [`write_report_artifacts`](pipeline::write_report_artifacts): persist the report

pub mod adapters;
pub mod aggregate;
pub mod classify;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod process;
pub mod settings;
pub mod trial;

pub use classify::{ClassifierTable, OutcomeClassifier};
pub use error::{RunError, TrialError};
pub use pipeline::{RunOutcome, run_trials, write_report_artifacts};
pub use settings::{LintMode, RunSettings, Selection, default_lint_command};

// Re-export codec types so embedders don't need confmut-codec directly.
pub use confmut_codec::{Format, LoadedDocument};
