use crate::MutateError;
use confmut_types::{Boundary, InferencePolicy, Scalar};

pub(crate) fn validate_policy(policy: &InferencePolicy) -> Result<(), MutateError> {
    let bad = |msg: String| Err(MutateError::InvalidBoundary(msg));
    if !(policy.factor.is_finite() && policy.factor > 0.0) {
        return bad(format!("inference factor must be positive, got {}", policy.factor));
    }
    if policy.integer_floor < 1 || policy.integer_ceiling < policy.integer_floor {
        return bad(format!(
            "integer inference needs 1 <= floor <= ceiling, got {} and {}",
            policy.integer_floor, policy.integer_ceiling
        ));
    }
    if !(policy.float_floor.is_finite()
        && policy.float_ceiling.is_finite()
        && policy.float_floor > 0.0
        && policy.float_ceiling >= policy.float_floor)
    {
        return bad(format!(
            "float inference needs 0 < floor <= ceiling, got {} and {}",
            policy.float_floor, policy.float_ceiling
        ));
    }
    Ok(())
}

/// Boundary for a leaf with no declaration, or `None` for nulls.
///
/// Numbers get a symmetric range `[-m, m]` with
/// `m = clamp(|value| * factor, floor, ceiling)`.
pub fn infer_boundary(value: &Scalar, policy: &InferencePolicy) -> Option<Boundary> {
    match value {
        Scalar::Null => None,
        Scalar::Bool(_) => Some(Boundary::Boolean),
        Scalar::String(_) => Some(Boundary::any_string()),
        Scalar::Integer(v) => {
            let scaled = v.unsigned_abs() as f64 * policy.factor;
            let m = scaled
                .max(policy.integer_floor as f64)
                .min(policy.integer_ceiling as f64) as i64;
            Some(Boundary::Integer { min: -m, max: m })
        }
        Scalar::Unsigned(_) => {
            let m = policy.integer_ceiling.max(policy.integer_floor) as i64;
            Some(Boundary::Integer { min: -m, max: m })
        }
        Scalar::Float(v) => {
            let scaled = if v.is_finite() { v.abs() * policy.factor } else { 0.0 };
            let m = scaled.max(policy.float_floor).min(policy.float_ceiling);
            Some(Boundary::Float { min: -m, max: m })
        }
    }
}
