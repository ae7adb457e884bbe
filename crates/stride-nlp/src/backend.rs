//! Solver backends and their selection by [`NlpSolver`].
//!
//! A backend consumes an assembled [`Problem`], records one decision vector
//! per iteration into it and reports how the run ended. Backend failures are
//! returned unchanged; nothing here retries.

use std::time::{Duration, Instant};

use stride_core::config::NlpSolver;
use stride_core::error::{ConfigError, Result};
use tracing::{debug, info};

use crate::problem::Problem;

/// Outcome of one backend run.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveReport {
    pub solver: NlpSolver,
    /// Iterates recorded during this run.
    pub iterations: usize,
    /// Cost of the final variables.
    pub cost: f64,
    /// Largest constraint or bound violation of the final variables.
    pub max_violation: f64,
    pub solve_time: Duration,
}

// ---------------------------------------------------------------------------
// SolverBackend
// ---------------------------------------------------------------------------

pub trait SolverBackend: Send + Sync {
    /// Which selection this backend serves.
    fn kind(&self) -> NlpSolver;

    /// Run on `problem`, recording every iterate into it and leaving its
    /// variables at the final iterate.
    fn solve(&self, problem: &mut Problem) -> Result<SolveReport>;

    /// Human-readable name for this backend.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Build a report for `problem` in its current state.
pub fn report(
    solver: NlpSolver,
    problem: &Problem,
    iterations: usize,
    started: Instant,
) -> Result<SolveReport> {
    Ok(SolveReport {
        solver,
        iterations,
        cost: problem.cost()?,
        max_violation: problem.max_violation()?,
        solve_time: started.elapsed(),
    })
}

// ---------------------------------------------------------------------------
// InitialGuessBackend
// ---------------------------------------------------------------------------

/// Records the initial guess as the only iterate, without optimizing.
///
/// Useful for inspecting an assembled problem and as the reference backend
/// when no external NLP solver is linked.
#[derive(Clone, Copy, Debug, Default)]
pub struct InitialGuessBackend;

impl SolverBackend for InitialGuessBackend {
    fn kind(&self) -> NlpSolver {
        NlpSolver::InitialGuess
    }

    fn solve(&self, problem: &mut Problem) -> Result<SolveReport> {
        let started = Instant::now();
        problem.record_iterate(problem.current_values())?;
        report(self.kind(), problem, 1, started)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "InitialGuessBackend"
    }
}

// ---------------------------------------------------------------------------
// SolverRegistry
// ---------------------------------------------------------------------------

/// Maps each [`NlpSolver`] to at most one backend.
pub struct SolverRegistry {
    backends: Vec<Box<dyn SolverBackend>>,
}

impl SolverRegistry {
    /// Registry with no backends at all.
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Register `backend`, replacing any backend of the same kind.
    pub fn register(&mut self, backend: Box<dyn SolverBackend>) {
        let kind = backend.kind();
        self.backends.retain(|b| b.kind() != kind);
        debug!(solver = %kind, backend = backend.name(), "registered solver backend");
        self.backends.push(backend);
    }

    pub fn supports(&self, kind: NlpSolver) -> bool {
        self.backends.iter().any(|b| b.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<NlpSolver> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Backend for `kind`, or a configuration error if none is registered.
    pub fn resolve(&self, kind: NlpSolver) -> Result<&dyn SolverBackend, ConfigError> {
        self.backends
            .iter()
            .find(|b| b.kind() == kind)
            .map(|b| &**b)
            .ok_or_else(|| ConfigError::UnsupportedSolver(kind.to_string()))
    }

    /// Resolve `kind` and run it on `problem`.
    pub fn solve(&self, kind: NlpSolver, problem: &mut Problem) -> Result<SolveReport> {
        let backend = self.resolve(kind)?;
        info!(solver = %kind, variables = problem.variable_count(), "solving");
        let report = backend.solve(problem)?;
        info!(
            solver = %kind,
            iterations = report.iterations,
            cost = report.cost,
            max_violation = report.max_violation,
            "solve finished"
        );
        Ok(report)
    }
}

/// Registry holding the built-in [`InitialGuessBackend`].
impl Default for SolverRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(InitialGuessBackend));
        registry
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;
    use stride_core::StrideError;
    use stride_vars::{Composite, NodeValues};

    use super::*;

    fn problem() -> Problem {
        let mut tree = Composite::new("vars");
        let mut spline = NodeValues::new(1, 2, "n");
        spline
            .initialize_variables(
                &DVector::from_element(1, 0.0),
                &DVector::from_element(1, 1.0),
                &[0.5, 0.5],
            )
            .unwrap();
        tree.add_component(spline).unwrap();
        Problem::new(tree)
    }

    #[test]
    fn initial_guess_records_seed() {
        let mut p = problem();
        let report = SolverRegistry::default()
            .solve(NlpSolver::InitialGuess, &mut p)
            .unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(p.iterate_count(), 1);
        assert_eq!(p.iterate(0).unwrap(), &p.current_values());
    }

    #[test]
    fn unregistered_solver_is_config_error() {
        let registry = SolverRegistry::default();
        assert!(matches!(
            registry.resolve(NlpSolver::Ipopt),
            Err(ConfigError::UnsupportedSolver(ref name)) if name == "ipopt"
        ));
        let mut p = problem();
        assert!(matches!(
            registry.solve(NlpSolver::Snopt, &mut p),
            Err(StrideError::Config(ConfigError::UnsupportedSolver(_)))
        ));
        assert_eq!(p.iterate_count(), 0);
    }

    #[test]
    fn register_replaces_same_kind() {
        let mut registry = SolverRegistry::empty();
        assert!(!registry.supports(NlpSolver::InitialGuess));
        registry.register(Box::new(InitialGuessBackend));
        registry.register(Box::new(InitialGuessBackend));
        assert_eq!(registry.kinds(), vec![NlpSolver::InitialGuess]);
    }
}
