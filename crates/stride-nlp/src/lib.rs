//! Problem assembly seam between the variable tree and an NLP solver.
//!
//! Holds the [`Problem`] value (variables, constraints, costs and the
//! recorded iterate history), the constraint/cost composites the planner's
//! factory fills, and the [`SolverBackend`] trait with its registry.

pub mod backend;
pub mod constraint;
pub mod cost;
pub mod problem;

pub use backend::{InitialGuessBackend, SolveReport, SolverBackend, SolverRegistry};
pub use constraint::{ConstraintComposite, ConstraintSet};
pub use cost::{CostComposite, CostTerm};
pub use problem::Problem;
