use crate::CoreError;

/// Scalar type for all monetary and rate arithmetic.
pub type Real = f64;

/// Absolute + relative comparison tolerance pair.
///
/// The defaults suit currency math at the magnitudes a plant model
/// produces; widen `abs` when comparing values near zero cost.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

/// Approximate equality, relative part scaled by the larger magnitude.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Reject NaN and infinities before they reach an artifact.
pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if !v.is_finite() {
        return Err(CoreError::NonFinite { what, value: v });
    }
    Ok(v)
}

/// Round to cents. Monetary artifacts are written with at most two decimals.
pub fn round_currency(v: Real) -> Real {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_tolerance_tracks_the_larger_magnitude() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        // A 0.5 gap vanishes against a billion-dollar magnitude.
        assert!(nearly_equal(1.0e9, 1.0e9 + 0.5, tol));
        // The same relative gap at unit magnitude does not.
        assert!(!nearly_equal(1.0, 1.002, tol));
    }

    #[test]
    fn absolute_tolerance_covers_values_near_zero() {
        let tol = Tolerances::default();
        assert!(nearly_equal(0.0, 5e-10, tol));
        assert!(!nearly_equal(0.0, 1e-3, tol));
    }

    #[test]
    fn non_finite_values_are_rejected_by_name() {
        assert_eq!(ensure_finite(42.0, "npv").unwrap(), 42.0);
        let err = ensure_finite(Real::INFINITY, "npv").unwrap_err();
        assert!(format!("{err}").contains("npv"));
        assert!(ensure_finite(Real::NAN, "price").is_err());
    }

    #[test]
    fn round_currency_to_cents() {
        assert_eq!(round_currency(2.338), 2.34);
        assert_eq!(round_currency(-2.333), -2.33);
        // Exact cent amounts pass through untouched.
        assert_eq!(round_currency(17.25), 17.25);
    }
}
