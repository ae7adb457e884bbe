//! Polynomial segments: cubic Hermite evaluation for node splines and
//! coefficient polynomials for the segmented base representation.

use nalgebra::DVector;
use stride_core::error::{ConsistencyError, Result};
use stride_core::types::StateLinXd;

use crate::bounds::{Bounds, NO_BOUND};
use crate::component::VariableSet;

/// Evaluate the cubic Hermite segment through `(p0, v0)` and `(p1, v1)`
/// lasting `duration` seconds, at local time `t`.
pub fn hermite_point(
    p0: &DVector<f64>,
    v0: &DVector<f64>,
    p1: &DVector<f64>,
    v1: &DVector<f64>,
    duration: f64,
    t: f64,
) -> StateLinXd {
    if duration <= 0.0 {
        return StateLinXd {
            p: p0.clone(),
            v: v0.clone(),
            a: DVector::zeros(p0.len()),
        };
    }

    let s = (t / duration).clamp(0.0, 1.0);
    let s2 = s * s;
    let s3 = s2 * s;
    let big_t = duration;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    let d00 = 6.0 * s2 - 6.0 * s;
    let d10 = 3.0 * s2 - 4.0 * s + 1.0;
    let d01 = -6.0 * s2 + 6.0 * s;
    let d11 = 3.0 * s2 - 2.0 * s;

    let dd00 = 12.0 * s - 6.0;
    let dd10 = 6.0 * s - 4.0;
    let dd01 = -12.0 * s + 6.0;
    let dd11 = 6.0 * s - 2.0;

    StateLinXd {
        p: p0 * h00 + v0 * (h10 * big_t) + p1 * h01 + v1 * (h11 * big_t),
        v: (p0 * d00 + v0 * (d10 * big_t) + p1 * d01 + v1 * (d11 * big_t)) / big_t,
        a: (p0 * dd00 + v0 * (dd10 * big_t) + p1 * dd01 + v1 * (dd11 * big_t)) / (big_t * big_t),
    }
}

// ---------------------------------------------------------------------------
// Polynomial
// ---------------------------------------------------------------------------

/// n-dimensional polynomial `p(t) = Σ c_k t^k` in local time.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<DVector<f64>>,
}

impl Polynomial {
    /// Zero polynomial of the given order and dimension.
    pub fn new(order: usize, n_dim: usize) -> Self {
        Self {
            coeffs: vec![DVector::zeros(n_dim); order + 1],
        }
    }

    pub fn order(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn n_dim(&self) -> usize {
        self.coeffs[0].len()
    }

    /// Coefficient of `t^k`.
    pub fn coeff(&self, k: usize) -> &DVector<f64> {
        &self.coeffs[k]
    }

    pub fn coeff_mut(&mut self, k: usize) -> &mut DVector<f64> {
        &mut self.coeffs[k]
    }

    /// Position, velocity and acceleration at local time `t`.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn point_at(&self, t: f64) -> StateLinXd {
        let mut state = StateLinXd::zeros(self.n_dim());
        for (k, c) in self.coeffs.iter().enumerate() {
            let kf = k as f64;
            let k_i = k as i32;
            state.p += c * t.powi(k_i);
            if k >= 1 {
                state.v += c * (kf * t.powi(k_i - 1));
            }
            if k >= 2 {
                state.a += c * (kf * (kf - 1.0) * t.powi(k_i - 2));
            }
        }
        state
    }
}

// ---------------------------------------------------------------------------
// PolynomialVars
// ---------------------------------------------------------------------------

/// Coefficients of one polynomial exposed as decision variables.
///
/// Vector layout is coefficient-major: `[c_0, c_1, ..., c_order]`, each of
/// `n_dim` entries.
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialVars {
    id: String,
    poly: Polynomial,
    bounds: Vec<Bounds>,
}

impl PolynomialVars {
    pub fn new(id: impl Into<String>, poly: Polynomial) -> Self {
        let rows = (poly.order() + 1) * poly.n_dim();
        Self {
            id: id.into(),
            poly,
            bounds: vec![NO_BOUND; rows],
        }
    }

    pub fn poly(&self) -> &Polynomial {
        &self.poly
    }

    /// Overwrite the coefficient of `t^k` without changing its bounds.
    pub fn set_coefficient(&mut self, k: usize, value: &DVector<f64>) -> Result<()> {
        self.check_coefficient(k, value)?;
        self.poly.coeff_mut(k).copy_from(value);
        Ok(())
    }

    /// Pin the coefficient of `t^k` to `value` through its bounds.
    pub fn fix_coefficient(&mut self, k: usize, value: &DVector<f64>) -> Result<()> {
        self.set_coefficient(k, value)?;
        let n_dim = self.poly.n_dim();
        for dim in 0..n_dim {
            self.bounds[k * n_dim + dim] = Bounds::fixed(value[dim]);
        }
        Ok(())
    }

    fn check_coefficient(&self, k: usize, value: &DVector<f64>) -> Result<()> {
        if k > self.poly.order() {
            return Err(ConsistencyError::DimensionMismatch {
                expected: self.poly.order() + 1,
                got: k + 1,
            }
            .into());
        }
        if value.len() != self.poly.n_dim() {
            return Err(ConsistencyError::DimensionMismatch {
                expected: self.poly.n_dim(),
                got: value.len(),
            }
            .into());
        }
        Ok(())
    }
}

impl VariableSet for PolynomialVars {
    fn id(&self) -> &str {
        &self.id
    }

    fn rows(&self) -> usize {
        self.bounds.len()
    }

    fn values(&self) -> DVector<f64> {
        let n_dim = self.poly.n_dim();
        DVector::from_fn(self.rows(), |i, _| self.poly.coeff(i / n_dim)[i % n_dim])
    }

    fn set_values(&mut self, x: &DVector<f64>) -> Result<()> {
        if x.len() != self.rows() {
            return Err(ConsistencyError::VectorLength {
                expected: self.rows(),
                got: x.len(),
            }
            .into());
        }
        let n_dim = self.poly.n_dim();
        for (i, &value) in x.iter().enumerate() {
            self.poly.coeff_mut(i / n_dim)[i % n_dim] = value;
        }
        Ok(())
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.bounds.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_row_slice(values)
    }

    #[test]
    fn hermite_hits_endpoints() {
        let (p0, v0, p1, v1) = (v(&[0.0, 1.0]), v(&[0.5, 0.0]), v(&[2.0, 1.0]), v(&[0.0, 0.0]));
        let start = hermite_point(&p0, &v0, &p1, &v1, 0.8, 0.0);
        assert_eq!(start.p, p0);
        assert!((start.v - &v0).norm() < 1e-12);
        let end = hermite_point(&p0, &v0, &p1, &v1, 0.8, 0.8);
        assert!((end.p - &p1).norm() < 1e-12);
        assert!((end.v - &v1).norm() < 1e-12);
    }

    #[test]
    fn hermite_straight_line_has_no_acceleration() {
        // Consistent velocities on a straight line reproduce linear motion.
        let (p0, p1) = (v(&[0.0]), v(&[1.0]));
        let vel = v(&[2.0]);
        let mid = hermite_point(&p0, &vel, &p1, &vel, 0.5, 0.25);
        assert!((mid.p[0] - 0.5).abs() < 1e-12);
        assert!((mid.v[0] - 2.0).abs() < 1e-12);
        assert!(mid.a[0].abs() < 1e-9);
    }

    #[test]
    fn polynomial_point_and_derivatives() {
        // p(t) = 1 + 2t + 3t^2
        let mut poly = Polynomial::new(2, 1);
        poly.coeff_mut(0)[0] = 1.0;
        poly.coeff_mut(1)[0] = 2.0;
        poly.coeff_mut(2)[0] = 3.0;
        let s = poly.point_at(2.0);
        assert!((s.p[0] - 17.0).abs() < 1e-12);
        assert!((s.v[0] - 14.0).abs() < 1e-12);
        assert!((s.a[0] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn polynomial_vars_layout_is_coefficient_major() {
        let mut vars = PolynomialVars::new("base_lin_0", Polynomial::new(1, 3));
        assert_eq!(vars.rows(), 6);
        vars.set_values(&v(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])).unwrap();
        assert_eq!(vars.poly().coeff(1), &v(&[4.0, 5.0, 6.0]));
        assert_eq!(vars.values(), v(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn fix_coefficient_sets_value_and_bounds() {
        let mut vars = PolynomialVars::new("p", Polynomial::new(3, 2));
        vars.fix_coefficient(1, &v(&[0.5, -0.5])).unwrap();
        let b = vars.bounds();
        assert_eq!(b[2], Bounds::fixed(0.5));
        assert_eq!(b[3], Bounds::fixed(-0.5));
        assert_eq!(b[0], NO_BOUND);
        assert!(vars.fix_coefficient(4, &v(&[0.0, 0.0])).is_err());
        assert!(vars.fix_coefficient(0, &v(&[0.0])).is_err());
    }

    #[test]
    fn set_values_rejects_wrong_length() {
        let mut vars = PolynomialVars::new("p", Polynomial::new(2, 1));
        assert!(vars.set_values(&v(&[1.0, 2.0])).is_err());
    }
}
