use crate::AfError;

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

/// Truth value of a signal: anything other than exactly zero is true.
#[inline]
pub fn is_true(v: Real) -> bool {
    v != 0.0
}

/// Encode a truth value as a signal value.
#[inline]
pub fn from_bool(b: bool) -> Real {
    if b { 1.0 } else { 0.0 }
}

/// Check that a slice is strictly increasing with no NaN entries.
pub fn ensure_strictly_increasing(values: &[Real], what: &'static str) -> Result<(), AfError> {
    if values.iter().any(|v| v.is_nan()) {
        return Err(AfError::InvalidArg { what });
    }
    if values.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AfError::InvalidArg { what });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn truth_values() {
        assert!(is_true(-0.5));
        assert!(!is_true(0.0));
        assert!(!is_true(-0.0));
        assert_eq!(from_bool(true), 1.0);
        assert_eq!(from_bool(false), 0.0);
    }

    #[test]
    fn strictly_increasing_rejects_repeats() {
        assert!(ensure_strictly_increasing(&[1.0, 2.0, 3.0], "bp").is_ok());
        assert!(ensure_strictly_increasing(&[1.0, 1.0], "bp").is_err());
        assert!(ensure_strictly_increasing(&[2.0, 1.0], "bp").is_err());
        assert!(ensure_strictly_increasing(&[0.0, Real::NAN], "bp").is_err());
    }
}
