//! The assembled optimization problem and its iterate history.
//!
//! A [`Problem`] is an explicit value: it owns the variable tree, the
//! constraint and cost composites built for that tree, and every decision
//! vector a solver backend recorded. Independent problems share nothing and
//! can be solved and sampled in parallel.

use nalgebra::DVector;
use stride_core::error::{ConsistencyError, RangeError, Result};
use stride_vars::{Bounds, Composite, VariableSet};
use tracing::info;

use crate::constraint::{ConstraintComposite, ConstraintSet};
use crate::cost::{CostComposite, CostTerm};

pub struct Problem {
    variables: Composite,
    constraints: ConstraintComposite,
    costs: CostComposite,
    iterates: Vec<DVector<f64>>,
}

impl Problem {
    /// Problem over `variables` with no constraints or costs yet.
    pub fn new(variables: Composite) -> Self {
        Self {
            variables,
            constraints: ConstraintComposite::new("constraints"),
            costs: CostComposite::new("costs"),
            iterates: Vec::new(),
        }
    }

    pub fn set_constraints(&mut self, constraints: ConstraintComposite) {
        self.constraints = constraints;
    }

    pub fn set_costs(&mut self, costs: CostComposite) {
        self.costs = costs;
    }

    pub fn variables(&self) -> &Composite {
        &self.variables
    }

    pub fn constraints(&self) -> &ConstraintComposite {
        &self.constraints
    }

    pub fn costs(&self) -> &CostComposite {
        &self.costs
    }

    /// Number of decision variables.
    pub fn variable_count(&self) -> usize {
        self.variables.rows()
    }

    /// Current decision vector (the initial guess before any solve).
    pub fn current_values(&self) -> DVector<f64> {
        self.variables.flatten()
    }

    pub fn variable_bounds(&self) -> Vec<Bounds> {
        self.variables.bounds()
    }

    /// Overwrite the current variables.
    pub fn set_variables(&mut self, x: &DVector<f64>) -> Result<()> {
        self.variables.scatter(x)
    }

    /// Weighted cost of the current variables.
    pub fn cost(&self) -> Result<f64> {
        self.costs.cost(&self.variables)
    }

    /// Constraint values of the current variables.
    pub fn constraint_values(&self) -> Result<DVector<f64>> {
        self.constraints.values(&self.variables)
    }

    /// Largest violation of any constraint row or variable bound.
    pub fn max_violation(&self) -> Result<f64> {
        let constraints = self.constraints.max_violation(&self.variables)?;
        let bounds = self
            .current_values()
            .iter()
            .zip(self.variable_bounds())
            .map(|(&value, b)| b.violation(value))
            .fold(0.0, f64::max);
        Ok(constraints.max(bounds))
    }

    // -----------------------------------------------------------------------
    // Iterate history
    // -----------------------------------------------------------------------

    /// Append one solver iterate. Its length must match the variables.
    pub fn record_iterate(&mut self, x: DVector<f64>) -> Result<()> {
        let expected = self.variable_count();
        if x.len() != expected {
            return Err(ConsistencyError::VectorLength {
                expected,
                got: x.len(),
            }
            .into());
        }
        self.iterates.push(x);
        Ok(())
    }

    pub fn clear_iterates(&mut self) {
        self.iterates.clear();
    }

    pub fn iterate_count(&self) -> usize {
        self.iterates.len()
    }

    pub fn iterates(&self) -> &[DVector<f64>] {
        &self.iterates
    }

    pub fn iterate(&self, index: usize) -> Result<&DVector<f64>> {
        self.iterates.get(index).ok_or_else(|| {
            RangeError::IterateOutOfRange {
                index,
                count: self.iterates.len(),
            }
            .into()
        })
    }

    /// Independent copy of the variable tree holding iterate `index`.
    pub fn variables_at(&self, index: usize) -> Result<Composite> {
        let x = self.iterate(index)?;
        let mut vars = self.variables.clone();
        vars.scatter(x)?;
        Ok(vars)
    }

    pub fn log_summary(&self) {
        self.variables.log_summary();
        info!("{}", self.constraints.summary());
        info!("{}", self.costs.summary());
    }
}

#[cfg(test)]
mod tests {
    use stride_core::StrideError;
    use stride_vars::NodeValues;

    use super::*;

    fn problem() -> Problem {
        let mut tree = Composite::new("vars");
        tree.add_component(NodeValues::new(1, 1, "n")).unwrap();
        Problem::new(tree)
    }

    #[test]
    fn record_iterate_checks_length() {
        let mut p = problem();
        assert_eq!(p.variable_count(), 4);
        p.record_iterate(DVector::from_element(4, 1.0)).unwrap();
        let err = p.record_iterate(DVector::zeros(3)).unwrap_err();
        assert!(matches!(
            err,
            StrideError::Consistency(ConsistencyError::VectorLength { expected: 4, got: 3 })
        ));
        assert_eq!(p.iterate_count(), 1);
    }

    #[test]
    fn variables_at_uses_independent_copy() {
        let mut p = problem();
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        p.record_iterate(x.clone()).unwrap();
        let vars = p.variables_at(0).unwrap();
        assert_eq!(vars.flatten(), x);
        // The problem's own variables are untouched.
        assert_eq!(p.current_values(), DVector::zeros(4));
    }

    #[test]
    fn iterate_out_of_range() {
        let p = problem();
        assert!(matches!(
            p.variables_at(0),
            Err(StrideError::Range(RangeError::IterateOutOfRange { index: 0, count: 0 }))
        ));
    }

    #[test]
    fn violation_includes_variable_bounds() {
        let mut tree = Composite::new("vars");
        let mut spline = NodeValues::new(1, 1, "n");
        spline
            .add_start_bound(stride_core::types::Derivative::Pos, &[0], &[0.0])
            .unwrap();
        tree.add_component(spline).unwrap();
        let mut p = Problem::new(tree);
        assert_eq!(p.max_violation().unwrap(), 0.0);
        p.set_variables(&DVector::from_vec(vec![0.5, 0.0, 0.0, 0.0]))
            .unwrap();
        assert!((p.max_violation().unwrap() - 0.5).abs() < 1e-12);
    }
}
