use crate::MutateError;
use rand::Rng;

/// Fraction of the range around the original value that sampling avoids.
const NEIGHBORHOOD: f64 = 0.05;

pub(crate) fn validate_integer(min: i64, max: i64) -> Result<(), MutateError> {
    if min > max {
        return Err(MutateError::InvalidBoundary(format!(
            "integer min {min} is greater than max {max}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_float(min: f64, max: f64) -> Result<(), MutateError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(MutateError::InvalidBoundary(format!(
            "float bounds must be finite, got [{min}, {max}]"
        )));
    }
    if min > max {
        return Err(MutateError::InvalidBoundary(format!(
            "float min {min} is greater than max {max}"
        )));
    }
    if !(max - min).is_finite() {
        return Err(MutateError::InvalidBoundary(format!(
            "float range [{min}, {max}] is too wide"
        )));
    }
    Ok(())
}

/// Uniform integer in `[min, max]`, avoiding the 5% neighborhood of
/// `original` when the range is wide enough and never returning `original`.
pub(crate) fn sample_integer<R: Rng + ?Sized>(
    min: i64,
    max: i64,
    original: i64,
    rng: &mut R,
) -> Result<i64, MutateError> {
    validate_integer(min, max)?;
    if min == max {
        return Err(MutateError::NoMutationPossible(format!(
            "integer range [{min}, {max}] has a single value"
        )));
    }

    let (lo, hi, orig) = (i128::from(min), i128::from(max), i128::from(original));
    let radius = ((hi - lo) as f64 * NEIGHBORHOOD) as i128;
    if radius > 0 {
        if let Some(v) = sample_outside(lo, hi, orig - radius, orig + radius, rng) {
            return Ok(v as i64);
        }
    }
    sample_outside(lo, hi, orig, orig, rng)
        .map(|v| v as i64)
        .ok_or_else(|| {
            MutateError::NoMutationPossible(format!(
                "integer range [{min}, {max}] holds only the original value"
            ))
        })
}

/// Uniform value of `[lo, hi]` outside `[ex_lo, ex_hi]`; `None` when the
/// exclusion covers the whole range.
fn sample_outside<R: Rng + ?Sized>(
    lo: i128,
    hi: i128,
    ex_lo: i128,
    ex_hi: i128,
    rng: &mut R,
) -> Option<i128> {
    let ex_lo = ex_lo.max(lo);
    let ex_hi = ex_hi.min(hi);
    if ex_lo > ex_hi {
        return Some(rng.random_range(lo..=hi));
    }
    let left = ex_lo - lo;
    let right = hi - ex_hi;
    let total = left + right;
    if total <= 0 {
        return None;
    }
    let k = rng.random_range(0..total);
    Some(if k < left { lo + k } else { ex_hi + 1 + (k - left) })
}

/// Uniform float in `[min, max]`, avoiding the 5% neighborhood of
/// `original` when possible and never returning `original`.
pub(crate) fn sample_float<R: Rng + ?Sized>(
    min: f64,
    max: f64,
    original: f64,
    rng: &mut R,
) -> Result<f64, MutateError> {
    validate_float(min, max)?;
    if min == max {
        return Err(MutateError::NoMutationPossible(format!(
            "float range [{min}, {max}] has a single value"
        )));
    }

    if original.is_finite() {
        let radius = (max - min) * NEIGHBORHOOD;
        let ex_lo = (original - radius).max(min);
        let ex_hi = (original + radius).min(max);
        if ex_lo > ex_hi {
            // Original lies outside the range; anything inside differs.
            return Ok(rng.random_range(min..=max));
        }
        let left = ex_lo - min;
        let right = max - ex_hi;
        let total = left + right;
        if total > 0.0 {
            let u = rng.random_range(0.0..total);
            let v = if u < left { min + u } else { ex_hi + (u - left) };
            let v = v.clamp(min, max);
            if v != original {
                return Ok(v);
            }
        }
    }

    for _ in 0..16 {
        let v = rng.random_range(min..=max);
        if v != original {
            return Ok(v);
        }
    }
    Ok(if min != original { min } else { max })
}
