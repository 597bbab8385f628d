//! Boundary-constrained mutation of scalar leaf values.
//!
//! Dispatch is over the closed set of [`Boundary`] variants. Each variant
//! carries its own sampling strategy:
//! - integer/float: uniform in `[min, max]`, away from the original value;
//! - string: candidate set, length/charset rule, or structural corruption;
//! - boolean: flip;
//! - enum: another member of the candidate set;
//! - sentinel: replacement for null leaves.
//!
//! All randomness comes from the [`MutationRng`] passed in, so a seeded run
//! always produces the same mutations.

use confmut_types::{Boundary, BoundarySource, BoundarySpec, LeafPath, Scalar, TypeTag};
use rand::Rng;
use tracing::trace;

mod error;
mod infer;
mod numeric;
mod rng;
mod strings;

pub use error::MutateError;
pub use infer::infer_boundary;
pub use rng::MutationRng;
pub use strings::StringStrategy;

/// A produced replacement value and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub value: Scalar,
    pub boundary: Boundary,
    pub source: BoundarySource,
    pub strategy: Option<StringStrategy>,
}

/// Check that a boundary can be sampled at all.
pub fn validate_boundary(boundary: &Boundary) -> Result<(), MutateError> {
    match boundary {
        Boundary::Integer { min, max } => numeric::validate_integer(*min, *max),
        Boundary::Float { min, max } => numeric::validate_float(*min, *max),
        Boundary::String {
            candidates,
            min_len,
            max_len,
            charset,
        } => {
            if candidates.is_empty() && has_rule(*min_len, *max_len, charset.as_deref()) {
                strings::StringRule::new(*min_len, *max_len, charset.as_deref())?;
            }
            Ok(())
        }
        Boundary::Boolean => Ok(()),
        Boundary::Enum { values } if values.is_empty() => Err(MutateError::InvalidBoundary(
            "enum candidate set is empty".to_string(),
        )),
        Boundary::Enum { .. } => Ok(()),
        Boundary::Sentinel { .. } => Ok(()),
    }
}

fn has_rule(min_len: Option<usize>, max_len: Option<usize>, charset: Option<&str>) -> bool {
    min_len.is_some() || max_len.is_some() || charset.is_some()
}

fn kind_name(boundary: &Boundary) -> &'static str {
    match boundary {
        Boundary::Integer { .. } => "integer",
        Boundary::Float { .. } => "float",
        Boundary::String { .. } => "string",
        Boundary::Boolean => "boolean",
        Boundary::Enum { .. } => "enum",
        Boundary::Sentinel { .. } => "sentinel",
    }
}

/// Produce a value different from `original` inside `boundary`.
///
/// Returns the value and, for corrupted strings, the strategy used.
pub fn mutate_value<R: Rng + ?Sized>(
    boundary: &Boundary,
    original: &Scalar,
    rng: &mut R,
) -> Result<(Scalar, Option<StringStrategy>), MutateError> {
    if !boundary.accepts(original) {
        return Err(MutateError::BoundaryMismatch {
            boundary: kind_name(boundary),
            found: original.type_tag(),
        });
    }

    let value = match (boundary, original) {
        (Boundary::Integer { min, max }, Scalar::Integer(v)) => {
            Scalar::Integer(numeric::sample_integer(*min, *max, *v, rng)?)
        }
        (Boundary::Integer { min, max }, Scalar::Unsigned(_)) => {
            Scalar::Integer(numeric::sample_integer(*min, *max, i64::MAX, rng)?)
        }
        (Boundary::Float { min, max }, Scalar::Float(v)) => {
            Scalar::Float(numeric::sample_float(*min, *max, *v, rng)?)
        }
        (
            Boundary::String {
                candidates,
                min_len,
                max_len,
                charset,
            },
            Scalar::String(s),
        ) => {
            if !candidates.is_empty() {
                Scalar::String(strings::pick_other(candidates, s, rng, "string")?)
            } else if has_rule(*min_len, *max_len, charset.as_deref()) {
                let rule = strings::StringRule::new(*min_len, *max_len, charset.as_deref())?;
                Scalar::String(rule.generate(s, rng)?)
            } else {
                let (out, strategy) = strings::corrupt(s, rng)?;
                return Ok((Scalar::String(out), Some(strategy)));
            }
        }
        (Boundary::Boolean, Scalar::Bool(b)) => Scalar::Bool(!b),
        (Boundary::Enum { values }, v) => strings::pick_other(values, v, rng, "enum")?,
        (Boundary::Sentinel { value }, _) => {
            if value.is_null() {
                return Err(MutateError::NoMutationPossible(
                    "sentinel for a null leaf is null".to_string(),
                ));
            }
            value.clone()
        }
        (boundary, original) => {
            return Err(MutateError::BoundaryMismatch {
                boundary: kind_name(boundary),
                found: original.type_tag(),
            });
        }
    };
    Ok((value, None))
}

/// Type-dispatched mutator over a set of declared boundaries.
#[derive(Debug, Clone, Default)]
pub struct Mutator {
    spec: BoundarySpec,
}

impl Mutator {
    /// Validates every declared boundary and the inference policy.
    pub fn new(spec: BoundarySpec) -> Result<Self, MutateError> {
        for field in &spec.fields {
            validate_boundary(&field.boundary).map_err(|e| match e {
                MutateError::InvalidBoundary(msg) => {
                    MutateError::InvalidBoundary(format!("'{}': {msg}", field.path))
                }
                other => other,
            })?;
        }
        infer::validate_policy(&spec.inference)?;
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &BoundarySpec {
        &self.spec
    }

    /// Declared boundary for `path`, else one inferred from `original`.
    pub fn boundary_for(
        &self,
        path: &LeafPath,
        original: &Scalar,
    ) -> Result<(Boundary, BoundarySource), MutateError> {
        if let Some(declared) = self.spec.lookup(path) {
            return Ok((declared.clone(), BoundarySource::Declared));
        }
        infer_boundary(original, &self.spec.inference)
            .map(|b| (b, BoundarySource::Inferred))
            .ok_or(MutateError::Unmutable(TypeTag::Null))
    }

    pub fn mutate(
        &self,
        path: &LeafPath,
        original: &Scalar,
        rng: &mut MutationRng,
    ) -> Result<Mutation, MutateError> {
        let (boundary, source) = self.boundary_for(path, original)?;
        let (value, strategy) = mutate_value(&boundary, original, rng)?;
        trace!(path = %path, original = %original, mutated = %value, ?source, "mutated leaf");
        Ok(Mutation {
            value,
            boundary,
            source,
            strategy,
        })
    }
}
