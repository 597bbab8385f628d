//! Shared DTOs (schemas-as-code) for the confmut workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod boundary;
pub mod outcome;
pub mod path;
pub mod pattern;
pub mod report;
pub mod scalar;

pub use boundary::{Boundary, BoundarySource, BoundarySpec, FieldBoundary, InferencePolicy};
pub use outcome::{
    DocumentFingerprint, ExecSignal, ExecStatus, LintSignal, MutationRecord, OutcomeCategory,
    TrialOutcome, TrialSignals,
};
pub use path::{LeafPath, PathParseError, PathSegment};
pub use pattern::{LeafPattern, PathFilter};
pub use report::{
    CategoryCounts, InferredBoundary, ReportRunInfo, ReportStatus, ReportToolInfo, ReportVerdict,
    RunReport, TrialFailure, UnmutatedLeaf,
};
pub use scalar::{Scalar, TypeTag};

/// Schema identifiers.
pub mod schema {
    pub const CONFMUT_REPORT_V1: &str = "confmut.report.v1";
}
