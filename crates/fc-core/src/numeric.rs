use crate::FcError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, FcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FcError::NonFinite { what, value: v })
    }
}

/// Reject values outside `[min, max]` instead of silently clamping them.
pub fn ensure_in_range(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, FcError> {
    let v = ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(FcError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

/// Require a strictly positive, finite value (lengths, diameters, densities).
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, FcError> {
    let v = ensure_finite(v, what)?;
    if v <= 0.0 {
        return Err(FcError::InvalidArg { what });
    }
    Ok(v)
}
