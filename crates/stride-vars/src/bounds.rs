//! Box bounds on single decision variables.

use stride_core::error::BoundsError;

/// Lower/upper bound on one decision variable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

/// No bound in either direction.
pub const NO_BOUND: Bounds = Bounds {
    lower: f64::NEG_INFINITY,
    upper: f64::INFINITY,
};

impl Bounds {
    /// Bound `[lower, upper]`. Fails if the range is empty.
    pub fn new(lower: f64, upper: f64) -> Result<Self, BoundsError> {
        if lower > upper || lower.is_nan() || upper.is_nan() {
            return Err(BoundsError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Equality bound pinning the variable to `value`.
    pub const fn fixed(value: f64) -> Self {
        Self {
            lower: value,
            upper: value,
        }
    }

    /// Symmetric bound `[-limit, limit]`.
    pub const fn symmetric(limit: f64) -> Self {
        Self {
            lower: -limit,
            upper: limit,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    #[allow(clippy::float_cmp)]
    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }

    /// Distance by which `value` lies outside the bound, zero if inside.
    pub fn violation(&self, value: f64) -> f64 {
        if value < self.lower {
            self.lower - value
        } else if value > self.upper {
            value - self.upper
        } else {
            0.0
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        NO_BOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bound_contains_only_value() {
        let b = Bounds::fixed(0.5);
        assert!(b.is_fixed());
        assert!(b.contains(0.5));
        assert!(!b.contains(0.5 + 1e-12));
    }

    #[test]
    fn empty_range_rejected() {
        assert!(matches!(
            Bounds::new(1.0, 0.0),
            Err(BoundsError::InvalidRange { .. })
        ));
        assert!(Bounds::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn violation_distance() {
        let b = Bounds::new(-1.0, 2.0).unwrap();
        assert!(b.violation(0.0).abs() < f64::EPSILON);
        assert!((b.violation(-1.5) - 0.5).abs() < 1e-12);
        assert!((b.violation(3.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_is_unbounded() {
        let b = Bounds::default();
        assert!(b.contains(1e300));
        assert!(b.contains(-1e300));
        assert!(!b.is_fixed());
    }
}
