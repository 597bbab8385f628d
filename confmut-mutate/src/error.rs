use confmut_types::TypeTag;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutateError {
    /// The boundary admits exactly one legal value.
    #[error("no mutation possible: {0}")]
    NoMutationPossible(String),

    #[error("{boundary} boundary cannot mutate a {found} value")]
    BoundaryMismatch { boundary: &'static str, found: TypeTag },

    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    /// Null leaf with no declared sentinel or candidate set.
    #[error("{0} leaves are not mutated without a declared boundary")]
    Unmutable(TypeTag),
}

impl MutateError {
    /// Taxonomy name used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            MutateError::NoMutationPossible(_) => "NoMutationPossibleError",
            MutateError::BoundaryMismatch { .. } => "BoundaryMismatchError",
            MutateError::InvalidBoundary(_) => "InvalidBoundaryError",
            MutateError::Unmutable(_) => "UnmutableLeaf",
        }
    }
}
