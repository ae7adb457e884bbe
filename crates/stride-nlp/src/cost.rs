//! Weighted cost terms evaluated against a variable tree.

use stride_core::error::Result;
use stride_vars::Composite;

/// A scalar cost of the current variable values.
pub trait CostTerm: Send + Sync {
    /// Human-readable name for this cost term.
    fn name(&self) -> &str;

    /// Unweighted cost.
    fn cost(&self, vars: &Composite) -> Result<f64>;
}

/// A weighted sum of cost terms.
///
/// Use [`breakdown`](Self::breakdown) to inspect individual contributions.
pub struct CostComposite {
    name: String,
    terms: Vec<(Box<dyn CostTerm>, f64)>,
}

impl CostComposite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terms: Vec::new(),
        }
    }

    pub fn add(&mut self, term: Box<dyn CostTerm>, weight: f64) {
        self.terms.push((term, weight));
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// `(name, weighted cost)` of every term.
    pub fn breakdown(&self, vars: &Composite) -> Result<Vec<(&str, f64)>> {
        let mut parts = Vec::with_capacity(self.terms.len());
        for (term, weight) in &self.terms {
            parts.push((term.name(), term.cost(vars)? * weight));
        }
        Ok(parts)
    }

    pub fn summary(&self) -> String {
        let mut out = format!("{} ({} terms)\n", self.name, self.terms.len());
        for (term, weight) in &self.terms {
            out.push_str(&format!("  {:<24} weight {weight}\n", term.name()));
        }
        out
    }
}

impl CostTerm for CostComposite {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self, vars: &Composite) -> Result<f64> {
        let mut total = 0.0;
        for (term, weight) in &self.terms {
            total += term.cost(vars)? * weight;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl CostTerm for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn cost(&self, _vars: &Composite) -> Result<f64> {
            Ok(self.0)
        }
    }

    #[test]
    fn weighted_sum() {
        let vars = Composite::new("vars");
        let mut costs = CostComposite::new("costs");
        costs.add(Box::new(Constant(2.0)), 0.5);
        costs.add(Box::new(Constant(1.0)), 3.0);
        assert!((costs.cost(&vars).unwrap() - 4.0).abs() < 1e-12);
        let parts = costs.breakdown(&vars).unwrap();
        assert_eq!(parts.len(), 2);
        assert!((parts[1].1 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_composite_costs_nothing() {
        let costs = CostComposite::new("costs");
        assert!(costs.is_empty());
        assert_eq!(costs.cost(&Composite::new("vars")).unwrap(), 0.0);
    }
}
