//! Constraint sets evaluated against a variable tree.

use nalgebra::DVector;
use stride_core::error::{ConsistencyError, Result};
use stride_vars::{Bounds, Composite};

// ---------------------------------------------------------------------------
// ConstraintSet
// ---------------------------------------------------------------------------

/// A block of constraint rows `g(x)` with one bound per row.
///
/// Implementations read the variables they need from the tree by identifier
/// and hold no reference to it.
pub trait ConstraintSet: Send + Sync {
    /// Human-readable name for this constraint set.
    fn name(&self) -> &str;

    /// Number of constraint rows.
    fn rows(&self) -> usize;

    /// Constraint values for the current state of `vars`.
    fn values(&self, vars: &Composite) -> Result<DVector<f64>>;

    /// One bound per row.
    fn bounds(&self) -> Vec<Bounds>;
}

// ---------------------------------------------------------------------------
// ConstraintComposite
// ---------------------------------------------------------------------------

/// Stacked constraint sets, evaluated in insertion order.
pub struct ConstraintComposite {
    name: String,
    sets: Vec<Box<dyn ConstraintSet>>,
}

impl ConstraintComposite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets: Vec::new(),
        }
    }

    pub fn add(&mut self, set: Box<dyn ConstraintSet>) {
        self.sets.push(set);
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sets.iter().map(|s| s.name()).collect()
    }

    /// Largest amount by which any row lies outside its bound.
    pub fn max_violation(&self, vars: &Composite) -> Result<f64> {
        let g = self.values(vars)?;
        Ok(g.iter()
            .zip(self.bounds())
            .map(|(&value, b)| b.violation(value))
            .fold(0.0, f64::max))
    }

    pub fn summary(&self) -> String {
        let mut out = format!("{} ({} rows)\n", self.name, self.rows());
        for set in &self.sets {
            out.push_str(&format!("  {:<24} {:>5}\n", set.name(), set.rows()));
        }
        out
    }
}

impl ConstraintSet for ConstraintComposite {
    fn name(&self) -> &str {
        &self.name
    }

    fn rows(&self) -> usize {
        self.sets.iter().map(|s| s.rows()).sum()
    }

    fn values(&self, vars: &Composite) -> Result<DVector<f64>> {
        let mut g = DVector::zeros(self.rows());
        let mut offset = 0;
        for set in &self.sets {
            let values = set.values(vars)?;
            if values.len() != set.rows() {
                return Err(ConsistencyError::VectorLength {
                    expected: set.rows(),
                    got: values.len(),
                }
                .into());
            }
            g.rows_mut(offset, values.len()).copy_from(&values);
            offset += values.len();
        }
        Ok(g)
    }

    fn bounds(&self) -> Vec<Bounds> {
        self.sets.iter().flat_map(|s| s.bounds()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
